pub mod complete;

pub use complete::CompleteOnboarding;
