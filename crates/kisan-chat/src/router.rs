//! Response mode selection and the search/reasoning toggle pair

use serde::{Deserialize, Serialize};

/// Which upstream capability answers a submitted turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseMode {
    PlainText,
    ImageAnalysis,
    SearchAugmented,
    DeepReasoning,
}

impl ResponseMode {
    pub fn label(&self) -> &'static str {
        match self {
            ResponseMode::PlainText => "text",
            ResponseMode::ImageAnalysis => "image",
            ResponseMode::SearchAugmented => "search",
            ResponseMode::DeepReasoning => "reasoning",
        }
    }

    /// Whether the reply may carry `>> ` follow-up suggestions
    pub fn extracts_suggestions(&self) -> bool {
        matches!(self, ResponseMode::PlainText | ResponseMode::DeepReasoning)
    }
}

/// Inputs to mode selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteInput {
    pub has_attached_image: bool,
    pub search_enabled: bool,
    pub reasoning_enabled: bool,
}

/// Pick the response mode. An attached image always wins, then reasoning,
/// then search.
pub fn select_mode(input: RouteInput) -> ResponseMode {
    if input.has_attached_image {
        ResponseMode::ImageAnalysis
    } else if input.reasoning_enabled {
        ResponseMode::DeepReasoning
    } else if input.search_enabled {
        ResponseMode::SearchAugmented
    } else {
        ResponseMode::PlainText
    }
}

/// A user-facing toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Search,
    Reasoning,
}

/// Search and reasoning toggles. At most one is on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggles {
    search: bool,
    reasoning: bool,
}

impl Toggles {
    pub fn search(&self) -> bool {
        self.search
    }

    pub fn reasoning(&self) -> bool {
        self.reasoning
    }

    /// Set one toggle. Turning one on turns the other off.
    pub fn set(&mut self, toggle: Toggle, on: bool) {
        match toggle {
            Toggle::Search => {
                self.search = on;
                if on {
                    self.reasoning = false;
                }
            }
            Toggle::Reasoning => {
                self.reasoning = on;
                if on {
                    self.search = false;
                }
            }
        }
    }

    /// Flip one toggle, returning its new state
    pub fn flip(&mut self, toggle: Toggle) -> bool {
        let on = match toggle {
            Toggle::Search => !self.search,
            Toggle::Reasoning => !self.reasoning,
        };
        self.set(toggle, on);
        on
    }

    /// Route a submission with these toggles
    pub fn route(&self, has_attached_image: bool) -> ResponseMode {
        select_mode(RouteInput {
            has_attached_image,
            search_enabled: self.search,
            reasoning_enabled: self.reasoning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_inputs() -> Vec<RouteInput> {
        let mut out = Vec::new();
        for bits in 0..8u8 {
            out.push(RouteInput {
                has_attached_image: bits & 1 != 0,
                search_enabled: bits & 2 != 0,
                reasoning_enabled: bits & 4 != 0,
            });
        }
        out
    }

    #[test]
    fn test_image_always_wins() {
        for input in all_inputs().into_iter().filter(|i| i.has_attached_image) {
            assert_eq!(select_mode(input), ResponseMode::ImageAnalysis, "{:?}", input);
        }
    }

    #[test]
    fn test_priority_without_image() {
        let base = RouteInput::default();
        assert_eq!(select_mode(base), ResponseMode::PlainText);
        assert_eq!(
            select_mode(RouteInput { search_enabled: true, ..base }),
            ResponseMode::SearchAugmented
        );
        assert_eq!(
            select_mode(RouteInput { reasoning_enabled: true, ..base }),
            ResponseMode::DeepReasoning
        );
        assert_eq!(
            select_mode(RouteInput {
                search_enabled: true,
                reasoning_enabled: true,
                ..base
            }),
            ResponseMode::DeepReasoning
        );
    }

    #[test]
    fn test_enabling_reasoning_clears_search() {
        let mut toggles = Toggles::default();
        toggles.set(Toggle::Search, true);
        toggles.set(Toggle::Reasoning, true);
        assert!(toggles.reasoning());
        assert!(!toggles.search());
        assert_eq!(toggles.route(false), ResponseMode::DeepReasoning);
    }

    #[test]
    fn test_enabling_search_clears_reasoning() {
        let mut toggles = Toggles::default();
        toggles.set(Toggle::Reasoning, true);
        toggles.set(Toggle::Search, true);
        assert!(toggles.search());
        assert!(!toggles.reasoning());
        assert_eq!(toggles.route(false), ResponseMode::SearchAugmented);
    }

    #[test]
    fn test_disabling_leaves_other_alone() {
        let mut toggles = Toggles::default();
        toggles.set(Toggle::Search, true);
        toggles.set(Toggle::Reasoning, false);
        assert!(toggles.search());
    }

    #[test]
    fn test_toggles_never_both_on() {
        // Every sequence of up to four operations
        let ops = [
            (Toggle::Search, true),
            (Toggle::Search, false),
            (Toggle::Reasoning, true),
            (Toggle::Reasoning, false),
        ];
        for a in ops {
            for b in ops {
                for c in ops {
                    for d in ops {
                        let mut t = Toggles::default();
                        for (toggle, on) in [a, b, c, d] {
                            t.set(toggle, on);
                            assert!(!(t.search() && t.reasoning()));
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_flip() {
        let mut toggles = Toggles::default();
        assert!(toggles.flip(Toggle::Search));
        assert!(toggles.flip(Toggle::Reasoning));
        assert!(!toggles.search());
        assert!(!toggles.flip(Toggle::Reasoning));
        assert_eq!(toggles.route(false), ResponseMode::PlainText);
    }

    #[test]
    fn test_image_overrides_search_toggle() {
        let mut toggles = Toggles::default();
        toggles.set(Toggle::Search, true);
        assert_eq!(toggles.route(true), ResponseMode::ImageAnalysis);
    }

    #[test]
    fn test_suggestion_policy() {
        assert!(ResponseMode::PlainText.extracts_suggestions());
        assert!(ResponseMode::DeepReasoning.extracts_suggestions());
        assert!(!ResponseMode::SearchAugmented.extracts_suggestions());
        assert!(!ResponseMode::ImageAnalysis.extracts_suggestions());
    }
}
