use serde::Serialize;

use crate::error::AppError;
use crate::models::package::Package;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeKind {
    Collection,
    DropOff,
}

impl CodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CodeKind::Collection => "collection",
            CodeKind::DropOff => "drop_off",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            CodeKind::Collection => "collection code",
            CodeKind::DropOff => "drop-off code",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CodeCheck {
    Matched,
    /// The package was booked without this code.
    NotConfigured,
    NotSupplied,
    Mismatch,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub valid: bool,
    pub message: String,
    pub tracking_number: String,
    pub kind: CodeKind,
    pub check: CodeCheck,
}

impl VerificationResult {
    /// The caller-facing error for a failed check; `None` when the code matched.
    pub fn to_error(&self) -> Option<AppError> {
        match self.check {
            CodeCheck::Matched => None,
            CodeCheck::NotConfigured => Some(AppError::MissingVerificationCode(self.message.clone())),
            CodeCheck::NotSupplied | CodeCheck::Mismatch => {
                Some(AppError::InvalidVerificationCode(self.message.clone()))
            }
        }
    }
}

pub fn verify_collection(package: &Package, supplied: Option<&str>) -> VerificationResult {
    verify(
        CodeKind::Collection,
        package,
        package.collection_code.as_deref(),
        supplied,
    )
}

pub fn verify_drop_off(package: &Package, supplied: Option<&str>) -> VerificationResult {
    verify(
        CodeKind::DropOff,
        package,
        package.drop_off_code.as_deref(),
        supplied,
    )
}

fn verify(
    kind: CodeKind,
    package: &Package,
    configured: Option<&str>,
    supplied: Option<&str>,
) -> VerificationResult {
    let configured = configured.filter(|code| !code.trim().is_empty());
    let supplied = supplied.filter(|code| !code.is_empty());

    let (check, message) = match (configured, supplied) {
        (None, _) => (
            CodeCheck::NotConfigured,
            format!(
                "no {} is configured for package {}; contact dispatch to issue one",
                kind.label(),
                package.tracking_number
            ),
        ),
        (Some(_), None) => (
            CodeCheck::NotSupplied,
            format!("a {} is required for package {}", kind.label(), package.tracking_number),
        ),
        (Some(expected), Some(given)) if expected == given => (
            CodeCheck::Matched,
            format!("{} verified", kind.label()),
        ),
        (Some(_), Some(_)) => (
            CodeCheck::Mismatch,
            format!(
                "the {} does not match package {}",
                kind.label(),
                package.tracking_number
            ),
        ),
    };

    VerificationResult {
        valid: check == CodeCheck::Matched,
        message,
        tracking_number: package.tracking_number.clone(),
        kind,
        check,
    }
}
