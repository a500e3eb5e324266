//! Banned and warned phrase catalogues for regulated-trade advertising copy.

use serde::{Deserialize, Serialize};
use tradeguard_core::{GuardError, GuardResult};

/// Category of a blocking finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ViolationCategory {
    CertificationClaims,
    Availability,
    PriceClaims,
    Guarantees,
    MissingCertification,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViolationSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// Category of an advisory finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WarningCategory {
    TimeCommitments,
    LocationAbsolutes,
    QualificationHints,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannedPhrase {
    pub phrase: String,
    #[serde(default)]
    pub replacement: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BannedCategory {
    pub category: ViolationCategory,
    pub severity: ViolationSeverity,
    pub reason: String,
    pub phrases: Vec<BannedPhrase>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WarnedCategory {
    pub category: WarningCategory,
    pub concern: String,
    pub recommendation: String,
    pub phrases: Vec<String>,
}

/// Immutable phrase tables a scanner is built from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhraseCatalogue {
    pub banned: Vec<BannedCategory>,
    pub warned: Vec<WarnedCategory>,
}

fn banned(phrase: &str, replacement: Option<&str>) -> BannedPhrase {
    BannedPhrase {
        phrase: phrase.to_string(),
        replacement: replacement.map(str::to_string),
    }
}

impl PhraseCatalogue {
    /// Catalogue for UK plumbing, heating and electrical advertising.
    pub fn uk_trades() -> Self {
        let banned = vec![
            BannedCategory {
                category: ViolationCategory::CertificationClaims,
                severity: ViolationSeverity::Critical,
                reason: "Certification claims must use the scheme's registered wording and be verified before publication".to_string(),
                phrases: vec![
                    banned("gas safe certified", Some("Gas Safe registered")),
                    banned("gas safe approved", Some("Gas Safe registered")),
                    banned("corgi registered", Some("Gas Safe registered")),
                    banned("part p certified", Some("Part P registered")),
                    banned("fully certified", Some("appropriately registered")),
                    banned("fully accredited", Some("appropriately registered")),
                    banned("government approved", None),
                ],
            },
            BannedCategory {
                category: ViolationCategory::Availability,
                severity: ViolationSeverity::High,
                reason: "Unqualified availability promises can mislead consumers under the CAP Code".to_string(),
                phrases: vec![
                    banned("24/7", Some("extended hours")),
                    banned("24 hours a day", Some("extended hours")),
                    banned("round the clock", Some("extended hours")),
                    banned("always available", Some("open by appointment")),
                    banned("immediate response", Some("prompt response")),
                    banned("same day guaranteed", Some("same day where possible")),
                ],
            },
            BannedCategory {
                category: ViolationCategory::PriceClaims,
                severity: ViolationSeverity::Medium,
                reason: "Comparative price claims must be substantiated".to_string(),
                phrases: vec![
                    banned("guaranteed lowest", Some("competitive")),
                    banned("lowest price", Some("competitive pricing")),
                    banned("cheapest", Some("competitively priced")),
                    banned("best price", Some("great value")),
                    banned("unbeatable price", Some("great value")),
                ],
            },
            BannedCategory {
                category: ViolationCategory::Guarantees,
                severity: ViolationSeverity::High,
                reason: "Absolute guarantees overstate the consumer's legal protection".to_string(),
                phrases: vec![
                    banned("100% guaranteed", Some("backed by our workmanship warranty")),
                    banned("guaranteed results", Some("quality workmanship")),
                    banned("risk free", Some("no-obligation")),
                    banned("risk-free", Some("no-obligation")),
                ],
            },
        ];

        let warned = vec![
            WarnedCategory {
                category: WarningCategory::TimeCommitments,
                concern: "Time commitments may be difficult to honour for every job".to_string(),
                recommendation: "Qualify response times with \"where possible\" or \"subject to availability\"".to_string(),
                phrases: ["same day", "within the hour", "within 1 hour", "next day", "fast response"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            WarnedCategory {
                category: WarningCategory::LocationAbsolutes,
                concern: "Service area claims should match where you actually operate".to_string(),
                recommendation: "List the specific towns or postcodes you cover".to_string(),
                phrases: ["all areas", "anywhere in", "nationwide", "every postcode"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
            WarnedCategory {
                category: WarningCategory::QualificationHints,
                concern: "Qualification claims should be backed by verifiable credentials".to_string(),
                recommendation: "Keep certificates and registration numbers ready to evidence the claim".to_string(),
                phrases: ["qualified", "accredited", "expert", "specialist", "master plumber"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            },
        ];

        Self { banned, warned }
    }

    /// Reject catalogues whose replacements reintroduce a banned phrase, since
    /// safe replacement could then never settle.
    pub fn validate(&self) -> GuardResult<()> {
        let all_banned: Vec<String> = self
            .banned
            .iter()
            .flat_map(|c| c.phrases.iter().map(|p| p.phrase.to_lowercase()))
            .collect();

        if all_banned.iter().any(|p| p.trim().is_empty()) {
            return Err(GuardError::Config("banned phrase must not be empty".to_string()));
        }

        for phrase in self.banned.iter().flat_map(|c| &c.phrases) {
            let Some(replacement) = &phrase.replacement else {
                continue;
            };
            let lowered = replacement.to_lowercase();
            if let Some(hit) = all_banned.iter().find(|b| lowered.contains(b.as_str())) {
                return Err(GuardError::Config(format!(
                    "replacement \"{}\" for \"{}\" contains banned phrase \"{}\"",
                    replacement, phrase.phrase, hit
                )));
            }
            if let Some(hit) = all_banned.iter().find(|b| words_overlap(&lowered, b)) {
                return Err(GuardError::Config(format!(
                    "replacement \"{}\" for \"{}\" can combine with neighbouring words into banned phrase \"{}\"",
                    replacement, phrase.phrase, hit
                )));
            }
        }
        Ok(())
    }
}

/// True when `banned` contains `replacement`, or when a run of words at one
/// end of `replacement` is also a run at the opposite end of `banned`.
fn words_overlap(replacement: &str, banned: &str) -> bool {
    let r: Vec<&str> = replacement.split_whitespace().collect();
    let b: Vec<&str> = banned.split_whitespace().collect();
    if r.is_empty() || b.is_empty() {
        return false;
    }
    if b.windows(r.len()).any(|w| w == r.as_slice()) {
        return true;
    }
    (1..r.len().min(b.len()) + 1).any(|k| {
        let head_tail = k < b.len() && r[..k] == b[b.len() - k..];
        let tail_head = k < b.len() && r[r.len() - k..] == b[..k];
        head_tail || tail_head
    })
}

impl Default for PhraseCatalogue {
    fn default() -> Self {
        Self::uk_trades()
    }
}

// ─── Certification keyword groups ─────────────────────────────────────────

/// Words that indicate gas work is being advertised.
pub const GAS_KEYWORDS: &[&str] = &["gas", "boiler", "central heating", "flue"];

/// Words that indicate notifiable electrical work is being advertised.
pub const ELECTRICAL_KEYWORDS: &[&str] = &[
    "rewire",
    "rewiring",
    "consumer unit",
    "fuse box",
    "fuseboard",
    "electrical installation",
    "new circuit",
];
