use crate::error::{GuardError, GuardResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Regulated trade a campaign advertises.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TradeType {
    Plumbing,
    Electrical,
    Heating,
    General,
}

impl TradeType {
    pub const ALL: [TradeType; 4] = [
        TradeType::Plumbing,
        TradeType::Electrical,
        TradeType::Heating,
        TradeType::General,
    ];
}

// ─── Certifications ─────────────────────────────────────────────────────────

/// Certification kinds that gate advertising eligibility.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum CertificationKind {
    GasSafe,
    PartP,
    Insurance,
    BusinessRegistration,
}

impl CertificationKind {
    pub const ALL: [CertificationKind; 4] = [
        CertificationKind::GasSafe,
        CertificationKind::PartP,
        CertificationKind::Insurance,
        CertificationKind::BusinessRegistration,
    ];

    /// Human-readable name shown to operators.
    pub fn display_name(self) -> &'static str {
        match self {
            CertificationKind::GasSafe => "Gas Safe Registration",
            CertificationKind::PartP => "Part P Electrical Certification",
            CertificationKind::Insurance => "Public Liability Insurance",
            CertificationKind::BusinessRegistration => "Business Registration",
        }
    }

    /// Identifier used in serialized certification records.
    pub fn key(self) -> &'static str {
        match self {
            CertificationKind::GasSafe => "gasSafe",
            CertificationKind::PartP => "partP",
            CertificationKind::Insurance => "insurance",
            CertificationKind::BusinessRegistration => "businessRegistration",
        }
    }
}

impl fmt::Display for CertificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for CertificationKind {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "gasSafe" | "gas_safe" => Ok(CertificationKind::GasSafe),
            "partP" | "part_p" => Ok(CertificationKind::PartP),
            "insurance" => Ok(CertificationKind::Insurance),
            "businessRegistration" | "business_registration" => {
                Ok(CertificationKind::BusinessRegistration)
            }
            other => Err(GuardError::UnknownCertification(other.to_string())),
        }
    }
}

/// Verification state of a single certification.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CertificationStatus {
    Verified,
    Pending,
    Rejected,
    Expired,
    #[default]
    Missing,
}

impl CertificationStatus {
    /// Statuses that block advertising of a service requiring this certification.
    pub fn is_blocking(self) -> bool {
        matches!(
            self,
            CertificationStatus::Missing
                | CertificationStatus::Rejected
                | CertificationStatus::Expired
        )
    }

    pub fn is_pending(self) -> bool {
        self == CertificationStatus::Pending
    }

    pub fn is_verified(self) -> bool {
        self == CertificationStatus::Verified
    }

    /// A previously submitted document was refused or has lapsed and may be
    /// replaced. Rejected and expired certifications get the same affordance.
    pub fn allows_reupload(self) -> bool {
        matches!(
            self,
            CertificationStatus::Rejected | CertificationStatus::Expired
        )
    }

    /// The operator must supply a document before this certification can count.
    pub fn requires_upload(self) -> bool {
        self == CertificationStatus::Missing || self.allows_reupload()
    }
}

/// One certification entry. `status` alone decides eligibility; the other
/// fields are informational.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CertificationRecord {
    #[serde(default)]
    pub status: CertificationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
}

impl CertificationRecord {
    pub fn with_status(status: CertificationStatus) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }
}

/// The operator's certification record, one entry per [`CertificationKind`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserCertifications {
    #[serde(default)]
    pub gas_safe: CertificationRecord,
    #[serde(default)]
    pub part_p: CertificationRecord,
    #[serde(default)]
    pub insurance: CertificationRecord,
    #[serde(default)]
    pub business_registration: CertificationRecord,
}

impl UserCertifications {
    /// Build a record from keyed entries. Kinds not listed stay `missing`;
    /// an unrecognised key is a fault.
    pub fn from_entries<I, K>(entries: I) -> GuardResult<Self>
    where
        I: IntoIterator<Item = (K, CertificationRecord)>,
        K: AsRef<str>,
    {
        let mut certs = Self::default();
        for (key, record) in entries {
            let kind: CertificationKind = key.as_ref().parse()?;
            *certs.get_mut(kind) = record;
        }
        Ok(certs)
    }

    /// Convenience for tests and fixtures: every kind set to `status`.
    pub fn all(status: CertificationStatus) -> Self {
        let mut certs = Self::default();
        for kind in CertificationKind::ALL {
            certs.get_mut(kind).status = status;
        }
        certs
    }

    pub fn with(mut self, kind: CertificationKind, status: CertificationStatus) -> Self {
        self.get_mut(kind).status = status;
        self
    }

    pub fn get(&self, kind: CertificationKind) -> &CertificationRecord {
        match kind {
            CertificationKind::GasSafe => &self.gas_safe,
            CertificationKind::PartP => &self.part_p,
            CertificationKind::Insurance => &self.insurance,
            CertificationKind::BusinessRegistration => &self.business_registration,
        }
    }

    pub fn get_mut(&mut self, kind: CertificationKind) -> &mut CertificationRecord {
        match kind {
            CertificationKind::GasSafe => &mut self.gas_safe,
            CertificationKind::PartP => &mut self.part_p,
            CertificationKind::Insurance => &mut self.insurance,
            CertificationKind::BusinessRegistration => &mut self.business_registration,
        }
    }

    pub fn status(&self, kind: CertificationKind) -> CertificationStatus {
        self.get(kind).status
    }
}

// ─── Campaign data ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceArea {
    /// Primary town or city, e.g. `"London"`.
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub radius_miles: Option<u32>,
    #[serde(default)]
    pub postcodes: Vec<String>,
}

impl ServiceArea {
    pub fn is_defined(&self) -> bool {
        !self.location.trim().is_empty() || self.postcodes.iter().any(|p| !p.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdCopy {
    #[serde(default)]
    pub headlines: Vec<String>,
    #[serde(default)]
    pub descriptions: Vec<String>,
}

/// Structured campaign content checked against the regulatory rule catalogue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CampaignData {
    pub trade_type: TradeType,
    #[serde(default)]
    pub service_area: ServiceArea,
    #[serde(default)]
    pub services: Vec<String>,
    #[serde(default)]
    pub ad_copy: AdCopy,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl CampaignData {
    /// Lower-cased concatenation of headlines, descriptions, services and keywords.
    pub fn searchable_text(&self) -> String {
        self.ad_copy
            .headlines
            .iter()
            .chain(&self.ad_copy.descriptions)
            .chain(&self.services)
            .chain(&self.keywords)
            .map(|s| s.to_lowercase())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
