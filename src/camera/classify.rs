use super::backend::PlatformCause;
use crate::error::CameraError;

/// Map a host failure onto the user-facing camera error.
///
/// Total: anything not recognised as a permission, missing-device or
/// busy-device failure becomes `Generic`.
pub fn classify(cause: &PlatformCause) -> CameraError {
    match cause {
        PlatformCause::PermissionDenied => CameraError::permission_denied(),
        PlatformCause::NotFound => CameraError::device_not_found(),
        PlatformCause::NotReadable => CameraError::device_unreadable(),
        PlatformCause::Unsupported => CameraError::unsupported_host(),
        PlatformCause::Other(_) => CameraError::generic(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{
        DEVICE_NOT_FOUND_MESSAGE, DEVICE_UNREADABLE_MESSAGE, GENERIC_CAMERA_MESSAGE,
        PERMISSION_DENIED_MESSAGE,
    };

    #[test]
    fn test_permission_refusal_maps_to_permission_denied() {
        for name in ["NotAllowedError", "PermissionDeniedError"] {
            let err = classify(&PlatformCause::from_error_name(name));
            assert_eq!(
                err,
                CameraError::PermissionDenied {
                    message: PERMISSION_DENIED_MESSAGE.to_string()
                }
            );
        }
    }

    #[test]
    fn test_device_failures() {
        let err = classify(&PlatformCause::from_error_name("NotFoundError"));
        assert_eq!(err.message(), DEVICE_NOT_FOUND_MESSAGE);

        for name in ["NotReadableError", "TrackStartError", "DevicesNotFoundError"] {
            let err = classify(&PlatformCause::from_error_name(name));
            assert_eq!(err.message(), DEVICE_UNREADABLE_MESSAGE);
        }
    }

    #[test]
    fn test_unrecognised_cause_is_generic() {
        let err = classify(&PlatformCause::from_error_name("OverconstrainedError"));
        assert_eq!(err, CameraError::generic());
        assert_eq!(err.message(), GENERIC_CAMERA_MESSAGE);

        let err = classify(&PlatformCause::Unsupported);
        assert_eq!(err.kind(), "generic");
    }
}
