/// The two passes over the track data
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Pass {
    #[default]
    Lifetime,
    Correction,
}

impl std::fmt::Display for Pass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Lifetime => write!(f, "lifetime"),
            Self::Correction => write!(f, "correction"),
        }
    }
}

/// Progress message sent from the processing thread
#[derive(Debug, Clone, Default)]
pub struct WorkerStatus {
    pub progress: f32,
    pub pass: Pass,
}

impl WorkerStatus {
    pub fn new(progress: f32, pass: Pass) -> Self {
        Self { progress, pass }
    }
}
