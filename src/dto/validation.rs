//! Validation helpers for DTOs.

use validator::ValidationError;

const MAX_CAMERA_ID_LENGTH: usize = 64;

/// Validates that a camera ID is 1 to 64 ASCII letters, digits, `-` or `_`.
///
/// # Examples
///
/// ```ignore
/// validate_camera_id("kitchen-cam_01") // Ok
/// validate_camera_id("")               // Err - empty
/// validate_camera_id("front door")     // Err - space
/// ```
pub fn validate_camera_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() || id.len() > MAX_CAMERA_ID_LENGTH {
        let mut err = ValidationError::new("camera_id_length");
        err.message = Some(
            format!(
                "Camera ID must be 1 to {MAX_CAMERA_ID_LENGTH} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_'))
    {
        let mut err = ValidationError::new("camera_id_format");
        err.message = Some("Camera ID must contain only ASCII letters, digits, `-` or `_`".into());
        return Err(err);
    }

    Ok(())
}
