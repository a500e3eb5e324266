//! Certification requirement engine: decides which requested services the
//! operator may advertise given their certification record.
//!
//! The engine is side-effect free. When `blocked_services` is non-empty the
//! caller owes one compliance event per blocked service; see
//! [`CertificationCheckResult::blocked`].

use crate::dedup_in_order;
use serde::{Deserialize, Serialize};
use tracing::warn;
use tradeguard_core::{CertificationKind, GuardError, GuardResult, UserCertifications};

/// Static catalogue entry mapping an advertisable service to the
/// certifications needed to advertise it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequirement {
    pub service_id: String,
    pub required_certifications: Vec<CertificationKind>,
    pub description: String,
    pub legal_risk: String,
    /// Indicative maximum fine in pounds sterling.
    pub max_fine_gbp: u32,
}

impl ServiceRequirement {
    fn new(
        service_id: &str,
        required: &[CertificationKind],
        description: &str,
        legal_risk: &str,
        max_fine_gbp: u32,
    ) -> Self {
        Self {
            service_id: service_id.to_string(),
            required_certifications: required.to_vec(),
            description: description.to_string(),
            legal_risk: legal_risk.to_string(),
            max_fine_gbp,
        }
    }

    fn risk_narrative(&self) -> String {
        format!(
            "{}: {} (fines up to £{})",
            self.description,
            self.legal_risk,
            format_thousands(self.max_fine_gbp)
        )
    }
}

/// A blocked service with the certifications it is missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedService {
    pub service_id: String,
    pub description: String,
    pub missing: Vec<CertificationKind>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificationCheckResult {
    pub can_advertise: bool,
    pub missing_certifications: Vec<String>,
    pub blocked_services: Vec<String>,
    pub warnings: Vec<String>,
    pub legal_risks: Vec<String>,
    /// Per-service detail backing `blocked_services`, one entry per service id.
    #[serde(default)]
    pub blocked: Vec<BlockedService>,
}

/// Immutable service → requirement table.
#[derive(Debug, Clone)]
pub struct ServiceCatalogue {
    entries: Vec<ServiceRequirement>,
}

impl ServiceCatalogue {
    pub fn new(entries: Vec<ServiceRequirement>) -> Self {
        Self { entries }
    }

    /// Services offered by UK plumbing, heating and electrical traders.
    pub fn uk_trades() -> Self {
        use CertificationKind::{GasSafe, Insurance, PartP};

        const GAS_REGS: &str =
            "Gas Safety (Installation and Use) Regulations 1998 require Gas Safe registration";
        const PART_P: &str =
            "Building Regulations Part P require notifiable electrical work to be certified";

        Self::new(vec![
            ServiceRequirement::new(
                "boiler_repair",
                &[GasSafe, Insurance],
                "Boiler repair and maintenance",
                GAS_REGS,
                20_000,
            ),
            ServiceRequirement::new(
                "boiler_installation",
                &[GasSafe, Insurance],
                "Boiler installation and replacement",
                GAS_REGS,
                20_000,
            ),
            ServiceRequirement::new(
                "gas_safety_certificate",
                &[GasSafe, Insurance],
                "Landlord gas safety certificates (CP12)",
                GAS_REGS,
                20_000,
            ),
            ServiceRequirement::new(
                "gas_appliance_installation",
                &[GasSafe, Insurance],
                "Gas hob, fire and cooker installation",
                GAS_REGS,
                20_000,
            ),
            ServiceRequirement::new(
                "central_heating",
                &[GasSafe, Insurance],
                "Central heating installation and repair",
                GAS_REGS,
                20_000,
            ),
            ServiceRequirement::new(
                "rewiring",
                &[PartP, Insurance],
                "Full and partial rewiring",
                PART_P,
                5_000,
            ),
            ServiceRequirement::new(
                "consumer_unit_replacement",
                &[PartP, Insurance],
                "Consumer unit (fuse box) replacement",
                PART_P,
                5_000,
            ),
            ServiceRequirement::new(
                "new_circuits",
                &[PartP, Insurance],
                "New circuit installation",
                PART_P,
                5_000,
            ),
            ServiceRequirement::new(
                "electrical_installation",
                &[PartP, Insurance],
                "Electrical installation in kitchens and bathrooms",
                PART_P,
                5_000,
            ),
            ServiceRequirement::new(
                "emergency_plumbing",
                &[Insurance],
                "Emergency plumbing call-outs",
                "Trading without public liability cover exposes customers to uninsured damage",
                5_000,
            ),
            ServiceRequirement::new(
                "bathroom_installation",
                &[Insurance],
                "Bathroom fitting",
                "Trading without public liability cover exposes customers to uninsured damage",
                5_000,
            ),
        ])
    }

    pub fn get(&self, service_id: &str) -> Option<&ServiceRequirement> {
        self.entries.iter().find(|e| e.service_id == service_id)
    }

    /// Strict lookup for callers that treat an unknown service as a fault.
    pub fn require(&self, service_id: &str) -> GuardResult<&ServiceRequirement> {
        self.get(service_id)
            .ok_or_else(|| GuardError::UnknownService(service_id.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.service_id.as_str())
    }

    pub fn services_requiring(&self, kind: CertificationKind) -> Vec<&ServiceRequirement> {
        self.entries
            .iter()
            .filter(|e| e.required_certifications.contains(&kind))
            .collect()
    }
}

impl Default for ServiceCatalogue {
    fn default() -> Self {
        Self::uk_trades()
    }
}

/// Stateless eligibility check over an immutable [`ServiceCatalogue`].
pub struct CertificationRequirementEngine {
    catalogue: ServiceCatalogue,
}

impl CertificationRequirementEngine {
    pub fn new(catalogue: ServiceCatalogue) -> Self {
        Self { catalogue }
    }

    pub fn catalogue(&self) -> &ServiceCatalogue {
        &self.catalogue
    }

    pub fn check_eligibility<S: AsRef<str>>(
        &self,
        requested_services: &[S],
        certs: &UserCertifications,
    ) -> CertificationCheckResult {
        let mut result = CertificationCheckResult::default();

        for service_id in requested_services {
            let service_id = service_id.as_ref();
            let Some(requirement) = self.catalogue.get(service_id) else {
                // Unlisted services are allowed; the gap is worth knowing about.
                warn!(service_id, "no certification requirements defined for service");
                result.warnings.push(format!(
                    "No certification requirements are defined for service '{service_id}'"
                ));
                continue;
            };

            let mut missing = Vec::new();
            for kind in &requirement.required_certifications {
                let status = certs.status(*kind);
                if status.is_blocking() {
                    missing.push(*kind);
                } else if status.is_pending() {
                    result.warnings.push(format!(
                        "{} is pending verification; {} cannot be advertised until it is verified",
                        kind.display_name(),
                        requirement.description
                    ));
                }
            }

            if missing.is_empty() {
                continue;
            }

            result
                .missing_certifications
                .extend(missing.iter().map(|k| k.display_name().to_string()));
            result.blocked_services.push(requirement.description.clone());
            result.legal_risks.push(requirement.risk_narrative());
            if !result.blocked.iter().any(|b| b.service_id == service_id) {
                result.blocked.push(BlockedService {
                    service_id: service_id.to_string(),
                    description: requirement.description.clone(),
                    missing,
                });
            }
        }

        dedup_in_order(&mut result.missing_certifications);
        dedup_in_order(&mut result.blocked_services);
        dedup_in_order(&mut result.legal_risks);
        dedup_in_order(&mut result.warnings);
        result.can_advertise = result.blocked_services.is_empty();
        result
    }
}

impl Default for CertificationRequirementEngine {
    fn default() -> Self {
        Self::new(ServiceCatalogue::uk_trades())
    }
}

fn format_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tradeguard_core::CertificationStatus;

    fn engine() -> CertificationRequirementEngine {
        CertificationRequirementEngine::default()
    }

    #[test]
    fn test_boiler_repair_without_gas_safe_is_blocked() {
        let certs = UserCertifications::all(CertificationStatus::Verified)
            .with(CertificationKind::GasSafe, CertificationStatus::Missing);
        let result = engine().check_eligibility(&["boiler_repair"], &certs);

        assert!(!result.can_advertise);
        assert_eq!(result.blocked_services, vec!["Boiler repair and maintenance"]);
        assert!(result
            .missing_certifications
            .contains(&"Gas Safe Registration".to_string()));
        assert_eq!(
            result.legal_risks,
            vec!["Boiler repair and maintenance: Gas Safety (Installation and Use) Regulations 1998 require Gas Safe registration (fines up to £20,000)"]
        );
        assert_eq!(result.blocked[0].missing, vec![CertificationKind::GasSafe]);
    }

    #[test]
    fn test_pending_certification_warns_without_blocking() {
        let certs = UserCertifications::all(CertificationStatus::Verified)
            .with(CertificationKind::PartP, CertificationStatus::Pending);
        let result = engine().check_eligibility(&["rewiring"], &certs);

        assert!(result.can_advertise);
        assert!(result.blocked_services.is_empty());
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].starts_with("Part P Electrical Certification is pending"));
    }

    #[test]
    fn test_rejected_and_expired_block() {
        for status in [CertificationStatus::Rejected, CertificationStatus::Expired] {
            let certs = UserCertifications::all(CertificationStatus::Verified)
                .with(CertificationKind::Insurance, status);
            let result = engine().check_eligibility(&["bathroom_installation"], &certs);
            assert!(!result.can_advertise);
            assert_eq!(
                result.missing_certifications,
                vec!["Public Liability Insurance"]
            );
        }
    }

    #[test]
    fn test_unknown_service_is_advisory() {
        let certs = UserCertifications::default();
        let result = engine().check_eligibility(&["tap_washer_swap"], &certs);
        assert!(result.can_advertise);
        assert_eq!(
            result.warnings,
            vec!["No certification requirements are defined for service 'tap_washer_swap'"]
        );
    }

    #[test]
    fn test_outputs_are_deduplicated_in_first_occurrence_order() {
        let certs = UserCertifications::default();
        let result = engine().check_eligibility(
            &["rewiring", "boiler_repair", "rewiring", "boiler_installation"],
            &certs,
        );
        assert_eq!(
            result.missing_certifications,
            vec![
                "Part P Electrical Certification",
                "Public Liability Insurance",
                "Gas Safe Registration"
            ]
        );
        assert_eq!(
            result.blocked_services,
            vec![
                "Full and partial rewiring",
                "Boiler repair and maintenance",
                "Boiler installation and replacement"
            ]
        );
        assert_eq!(result.legal_risks.len(), 3);
        assert_eq!(result.blocked.len(), 3);
    }

    #[test]
    fn test_strict_lookup() {
        let catalogue = ServiceCatalogue::uk_trades();
        assert!(catalogue.require("rewiring").is_ok());
        assert!(matches!(
            catalogue.require("roofing"),
            Err(GuardError::UnknownService(_))
        ));
        assert_eq!(catalogue.services_requiring(CertificationKind::PartP).len(), 4);
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(5_000), "5,000");
        assert_eq!(format_thousands(1_234_567), "1,234,567");
    }

    fn status_strategy() -> impl Strategy<Value = CertificationStatus> {
        prop_oneof![
            Just(CertificationStatus::Verified),
            Just(CertificationStatus::Pending),
            Just(CertificationStatus::Rejected),
            Just(CertificationStatus::Expired),
            Just(CertificationStatus::Missing),
        ]
    }

    proptest! {
        #[test]
        fn prop_can_advertise_iff_nothing_blocked(
            statuses in proptest::collection::vec(status_strategy(), 4),
            picks in proptest::collection::vec(0usize..13, 0..6),
        ) {
            let mut certs = UserCertifications::default();
            for (kind, status) in CertificationKind::ALL.iter().zip(&statuses) {
                certs.get_mut(*kind).status = *status;
            }
            let catalogue = ServiceCatalogue::uk_trades();
            let mut ids: Vec<String> = catalogue.ids().map(str::to_string).collect();
            ids.push("unlisted_service".to_string());
            let services: Vec<&str> = picks.iter().map(|i| ids[i % ids.len()].as_str()).collect();

            let result = engine().check_eligibility(&services, &certs);
            prop_assert_eq!(result.can_advertise, result.blocked_services.is_empty());
        }
    }
}
