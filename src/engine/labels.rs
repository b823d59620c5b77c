//! Class labels of the fresh/rotten classifier

/// Predicted produce condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    Healthy,
    Rotten,
}

impl Label {
    /// Model output order
    pub const ALL: [Label; 2] = [Label::Healthy, Label::Rotten];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Healthy => "Healthy",
            Label::Rotten => "Rotten",
        }
    }

    pub fn from_index(idx: usize) -> Option<Self> {
        Self::ALL.get(idx).copied()
    }
}

impl std::fmt::Display for Label {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pick the highest scoring class.
///
/// The first index wins on ties and NaN scores are never selected. Returns
/// `None` when the vector does not hold exactly one score per label or holds
/// no comparable score at all.
pub fn select(scores: &[f32]) -> Option<(Label, f32)> {
    if scores.len() != Label::ALL.len() {
        return None;
    }

    let mut best: Option<(usize, f32)> = None;
    for (idx, &score) in scores.iter().enumerate() {
        if score.is_nan() {
            continue;
        }
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((idx, score)),
        }
    }

    best.and_then(|(idx, score)| Label::from_index(idx).map(|label| (label, score)))
}
