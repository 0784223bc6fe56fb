use regex::Regex;
use snapmark_schemas::IntentResult;
use tracing::debug;

pub const GENERAL_INTENT: &str = "Review this page";
pub const GENERAL_NEXT_ACTION: &str = "Read and analyze";
pub const GENERAL_TAGS: &[&str] = &["general", "reading"];

const TOPIC_PLACEHOLDER: &str = "{topic}";

/// Page category recognised by the pattern engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentCategory {
    Documentation,
    Tutorial,
    Shopping,
    Recipe,
    Academic,
    News,
    Programming,
    Entertainment,
    Tools,
    General,
}

impl IntentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntentCategory::Documentation => "documentation",
            IntentCategory::Tutorial => "tutorial",
            IntentCategory::Shopping => "shopping",
            IntentCategory::Recipe => "recipe",
            IntentCategory::Academic => "academic",
            IntentCategory::News => "news",
            IntentCategory::Programming => "programming",
            IntentCategory::Entertainment => "entertainment",
            IntentCategory::Tools => "tools",
            IntentCategory::General => "general",
        }
    }
}

/// One entry of the ordered rule table
struct CategoryRule {
    category: IntentCategory,
    pattern: Regex,
    /// Title words skipped when looking for a topic
    topic_keywords: &'static [&'static str],
    /// Intent with a `{topic}` slot, when the category uses one
    topic_intent: Option<&'static str>,
    default_intent: &'static str,
    next_action: &'static str,
    tags: &'static [&'static str],
}

impl CategoryRule {
    fn intent_for(&self, title: &str) -> String {
        self.topic_intent
            .and_then(|template| {
                extract_topic(title, self.topic_keywords)
                    .map(|topic| template.replace(TOPIC_PLACEHOLDER, &topic))
            })
            .unwrap_or_else(|| self.default_intent.to_string())
    }
}

/// Pattern-based intent classifier. Rules are evaluated in a fixed order and
/// the first match wins, so the order is part of the contract.
pub struct IntentClassifier {
    rules: Vec<CategoryRule>,
}

impl Default for IntentClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentClassifier {
    pub fn new() -> Self {
        Self {
            rules: vec![
                CategoryRule {
                    category: IntentCategory::Documentation,
                    pattern: Regex::new(r"\b(docs?|documentation|api|reference|manual|specification|readme|guide)\b").unwrap(),
                    topic_keywords: &["docs", "documentation", "api", "reference", "manual"],
                    topic_intent: Some("Reference {topic} for development"),
                    default_intent: "Reference documentation",
                    next_action: "Bookmark for quick reference",
                    tags: &["documentation", "reference"],
                },
                CategoryRule {
                    category: IntentCategory::Tutorial,
                    pattern: Regex::new(r"\b(tutorial|how[\s-]to|walkthrough|step[\s-]by[\s-]step|learn|course|lesson|beginner|introduction)\b").unwrap(),
                    topic_keywords: &["tutorial", "learn", "guide", "how to"],
                    topic_intent: Some("Follow {topic} tutorial"),
                    default_intent: "Follow tutorial",
                    next_action: "Practice the steps",
                    tags: &["tutorial", "learning"],
                },
                CategoryRule {
                    category: IntentCategory::Shopping,
                    pattern: Regex::new(r"\b(buy|price|purchase|order|cart|shop|deal|sale|discount|checkout|product|store|amazon|ebay)\b").unwrap(),
                    topic_keywords: &["buy", "price", "purchase", "order"],
                    topic_intent: Some("Research {topic} purchase"),
                    default_intent: "Research product purchase",
                    next_action: "Compare prices and reviews",
                    tags: &["shopping", "product"],
                },
                CategoryRule {
                    category: IntentCategory::Recipe,
                    pattern: Regex::new(r"\b(recipe|cook|bake|ingredient|serving|meal|dish|cuisine|food|preparation)\b").unwrap(),
                    topic_keywords: &["recipe", "cook", "bake"],
                    topic_intent: Some("Try {topic} recipe"),
                    default_intent: "Try recipe",
                    next_action: "Add ingredients to list",
                    tags: &["recipe", "cooking"],
                },
                CategoryRule {
                    category: IntentCategory::Academic,
                    pattern: Regex::new(r"\b(study|paper|research|journal|thesis|academic|publication|abstract|doi|scholar)\b").unwrap(),
                    topic_keywords: &["research", "study", "paper"],
                    topic_intent: Some("Research {topic} literature"),
                    default_intent: "Research academic topic",
                    next_action: "Add to research notes",
                    tags: &["academic", "research"],
                },
                CategoryRule {
                    category: IntentCategory::News,
                    pattern: Regex::new(r"\b(news|breaking|update|announcement|press|release|report|latest)\b").unwrap(),
                    topic_keywords: &[],
                    topic_intent: None,
                    default_intent: "Read news update",
                    next_action: "Stay informed",
                    tags: &["news", "article"],
                },
                CategoryRule {
                    category: IntentCategory::Programming,
                    pattern: Regex::new(r"\b(code|programming|javascript|python|java|react|vue|angular|node|function|class|github|npm)\b").unwrap(),
                    topic_keywords: &["javascript", "python", "react", "node", "programming"],
                    topic_intent: Some("Learn {topic} programming"),
                    default_intent: "Learn programming concept",
                    next_action: "Try code examples",
                    tags: &["programming", "code"],
                },
                CategoryRule {
                    category: IntentCategory::Entertainment,
                    pattern: Regex::new(r"\b(movie|film|game|video|music|stream|watch|play|tv|series)\b").unwrap(),
                    topic_keywords: &[],
                    topic_intent: None,
                    default_intent: "Explore entertainment",
                    next_action: "Watch or enjoy later",
                    tags: &["entertainment", "media"],
                },
                CategoryRule {
                    category: IntentCategory::Tools,
                    pattern: Regex::new(r"\b(tool|software|app|application|download|install|setup|plugin|extension)\b").unwrap(),
                    topic_keywords: &["tool", "app", "software"],
                    topic_intent: Some("Evaluate {topic}"),
                    default_intent: "Evaluate tool",
                    next_action: "Test features",
                    tags: &["tools", "software"],
                },
            ],
        }
    }

    /// Categories in evaluation order
    pub fn categories(&self) -> Vec<IntentCategory> {
        self.rules.iter().map(|r| r.category).collect()
    }

    /// First category whose pattern matches title + excerpt
    pub fn category_of(&self, title: &str, excerpt: &str) -> IntentCategory {
        self.matching_rule(title, excerpt)
            .map(|r| r.category)
            .unwrap_or(IntentCategory::General)
    }

    /// Classify a page; total over all inputs
    pub fn classify(&self, title: &str, excerpt: &str) -> IntentResult {
        let Some(rule) = self.matching_rule(title, excerpt) else {
            debug!("No category matched, using general intent");
            return IntentResult {
                intent: GENERAL_INTENT.to_string(),
                tags: GENERAL_TAGS.iter().map(|t| t.to_string()).collect(),
                next_action: GENERAL_NEXT_ACTION.to_string(),
            };
        };

        debug!("Pattern classifier matched {}", rule.category.as_str());

        IntentResult {
            intent: rule.intent_for(title),
            tags: rule.tags.iter().map(|t| t.to_string()).collect(),
            next_action: rule.next_action.to_string(),
        }
    }

    fn matching_rule(&self, title: &str, excerpt: &str) -> Option<&CategoryRule> {
        let combined = format!("{} {}", title, excerpt).to_lowercase();
        self.rules.iter().find(|r| r.pattern.is_match(&combined))
    }
}

/// First title word longer than 3 letters that is not a keyword, paired with
/// the following word when that one is longer than 2 letters.
pub fn extract_topic(title: &str, keywords: &[&str]) -> Option<String> {
    let words: Vec<String> = title
        .to_lowercase()
        .split_whitespace()
        .map(letters_only)
        .collect();

    for (i, word) in words.iter().enumerate() {
        if word.len() <= 3 || keywords.contains(&word.as_str()) {
            continue;
        }

        return match words.get(i + 1) {
            Some(next) if next.len() > 2 => Some(format!("{} {}", word, next)),
            _ => Some(word.clone()),
        };
    }

    None
}

fn letters_only(word: &str) -> String {
    word.chars().filter(|c| c.is_ascii_lowercase()).collect()
}
