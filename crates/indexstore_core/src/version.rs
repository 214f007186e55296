//! Version negotiation.

use crate::error::VersionError;
use indexstore_abi::AbiVersion;

/// Checks a reported API version against the required one.
///
/// The majors must be equal and the reported minor must not be lower than
/// the required minor.
pub fn negotiate(required: AbiVersion, reported: AbiVersion) -> Result<(), VersionError> {
    if required.is_compatible_with(reported) {
        Ok(())
    } else {
        Err(VersionError::Incompatible {
            kind: "API",
            required,
            reported,
        })
    }
}

/// Checks the on-disk format version when one is configured.
pub fn check_format(required: Option<u32>, reported: u32) -> Result<(), VersionError> {
    match required {
        Some(required) if required != reported => {
            Err(VersionError::FormatMismatch { required, reported })
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexstore_abi::REQUIRED_VERSION;

    #[test]
    fn older_minor_rejected() {
        let err = negotiate(REQUIRED_VERSION, AbiVersion::new(0, 14)).unwrap_err();
        assert_eq!(
            err,
            VersionError::Incompatible {
                kind: "API",
                required: REQUIRED_VERSION,
                reported: AbiVersion::new(0, 14),
            }
        );
    }

    #[test]
    fn newer_minor_accepted() {
        assert!(negotiate(REQUIRED_VERSION, AbiVersion::new(0, 15)).is_ok());
        assert!(negotiate(REQUIRED_VERSION, AbiVersion::new(0, 16)).is_ok());
    }

    #[test]
    fn major_must_match() {
        assert!(negotiate(REQUIRED_VERSION, AbiVersion::new(1, 15)).is_err());
        assert!(negotiate(AbiVersion::new(1, 0), AbiVersion::new(0, 99)).is_err());
    }

    #[test]
    fn format_check_is_opt_in() {
        assert!(check_format(None, 13).is_ok());
        assert!(check_format(Some(13), 13).is_ok());
        assert_eq!(
            check_format(Some(13), 14),
            Err(VersionError::FormatMismatch {
                required: 13,
                reported: 14
            })
        );
    }
}
