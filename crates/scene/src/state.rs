use std::fmt;

/// Drill-down depth.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum SceneId {
    Overview,
    BySubCategory,
    Trend,
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SceneId::Overview => "overview",
            SceneId::BySubCategory => "by-sub-category",
            SceneId::Trend => "trend",
        })
    }
}

/// The current view. Each variant carries exactly the selections its depth
/// requires, so a trend can never lack a category and the overview can never
/// hold a stale selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SceneState {
    #[default]
    Overview,
    BySubCategory {
        category: String,
    },
    Trend {
        category: String,
        sub_category: String,
    },
}

/// User input arriving from the interaction surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interaction {
    /// Activation of the mark carrying this key.
    Select(String),
    Back,
}

impl Interaction {
    pub fn select(key: impl Into<String>) -> Self {
        Interaction::Select(key.into())
    }
}

impl SceneState {
    pub fn scene(&self) -> SceneId {
        match self {
            SceneState::Overview => SceneId::Overview,
            SceneState::BySubCategory { .. } => SceneId::BySubCategory,
            SceneState::Trend { .. } => SceneId::Trend,
        }
    }

    pub fn selected_category(&self) -> Option<&str> {
        match self {
            SceneState::Overview => None,
            SceneState::BySubCategory { category } | SceneState::Trend { category, .. } => {
                Some(category.as_str())
            }
        }
    }

    pub fn selected_sub_category(&self) -> Option<&str> {
        match self {
            SceneState::Trend { sub_category, .. } => Some(sub_category.as_str()),
            _ => None,
        }
    }

    /// The back control is live everywhere except the overview.
    pub fn back_enabled(&self) -> bool {
        self.scene() != SceneId::Overview
    }
}

/// Pure transition function. Interactions with no meaning in the current
/// scene (back at the overview, select on the trend) return the state
/// unchanged.
pub fn transition(state: &SceneState, interaction: &Interaction) -> SceneState {
    match (state, interaction) {
        (SceneState::Overview, Interaction::Select(category)) => SceneState::BySubCategory {
            category: category.clone(),
        },
        (SceneState::BySubCategory { category }, Interaction::Select(sub_category)) => {
            SceneState::Trend {
                category: category.clone(),
                sub_category: sub_category.clone(),
            }
        }
        (SceneState::BySubCategory { .. }, Interaction::Back) => SceneState::Overview,
        (SceneState::Trend { category, .. }, Interaction::Back) => SceneState::BySubCategory {
            category: category.clone(),
        },
        (SceneState::Overview, Interaction::Back)
        | (SceneState::Trend { .. }, Interaction::Select(_)) => state.clone(),
    }
}
