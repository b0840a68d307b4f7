//! Upload-intent validation.
//!
//! Every violated constraint is reported, not just the first. Batch envelopes
//! are checked before their elements.

use danmu_shared::FieldError;
use validator::{Validate, ValidationErrors};

use super::error::UploadError;
use super::types::{
    BatchDeleteRequest, BatchUploadRequest, MAX_BATCH_DELETE, MAX_BATCH_UPLOAD, UploadIntent,
};

const INVALID_REQUEST: &str = "请求参数错误";

/// Validate a single upload intent.
pub fn validate_intent(intent: &UploadIntent) -> Result<(), UploadError> {
    let mut errors = Vec::new();
    if let Err(e) = intent.validate() {
        collect(&e, "", &mut errors);
    }
    into_result(errors)
}

/// Validate a batch upload: `1..=10` files, then every file.
pub fn validate_batch_upload(request: &BatchUploadRequest) -> Result<(), UploadError> {
    if request.files.is_empty() {
        return Err(UploadError::invalid_field("至少需要一个文件", "files", "length"));
    }
    if request.files.len() > MAX_BATCH_UPLOAD {
        return Err(UploadError::invalid_field(
            "最多支持10个文件同时上传",
            "files",
            "length",
        ));
    }

    let mut errors = Vec::new();
    for (index, intent) in request.files.iter().enumerate() {
        if let Err(e) = intent.validate() {
            collect(&e, &format!("files[{index}]."), &mut errors);
        }
    }
    into_result(errors)
}

/// Validate a batch delete envelope: `1..=100` keys.
pub fn validate_batch_delete(request: &BatchDeleteRequest) -> Result<(), UploadError> {
    if request.file_names.is_empty() {
        return Err(UploadError::invalid_field(
            "文件名列表不能为空",
            "fileNames",
            "length",
        ));
    }
    if request.file_names.len() > MAX_BATCH_DELETE {
        return Err(UploadError::invalid_field(
            "一次最多删除100个文件",
            "fileNames",
            "length",
        ));
    }
    Ok(())
}

fn into_result(mut errors: Vec<FieldError>) -> Result<(), UploadError> {
    if errors.is_empty() {
        return Ok(());
    }
    errors.sort_by(|a, b| a.field.cmp(&b.field));
    Err(UploadError::Validation {
        message: INVALID_REQUEST.to_string(),
        errors,
    })
}

fn collect(errors: &ValidationErrors, path: &str, out: &mut Vec<FieldError>) {
    for (field, field_errors) in errors.field_errors() {
        let field = format!("{path}{}", camel_case(&field.to_string()));
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map_or_else(|| error.code.to_string(), ToString::to_string);
            out.push(FieldError::new(field.clone(), error.code.to_string(), message));
        }
    }
}

/// `file_size` -> `fileSize`, matching the JSON field names.
fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.push(c.to_ascii_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::upload::MAX_FILE_SIZE;
    use proptest::prelude::*;

    fn fields(err: UploadError) -> Vec<String> {
        match err {
            UploadError::Validation { errors, .. } => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_valid_intent() {
        assert!(validate_intent(&UploadIntent::new("a.png", "image/png", 1000)).is_ok());
        assert!(validate_intent(&UploadIntent::new("a.png", "image/png", MAX_FILE_SIZE)).is_ok());
    }

    #[test]
    fn test_every_violation_reported() {
        let err = validate_intent(&UploadIntent::new("", "", 0)).unwrap_err();
        assert_eq!(fields(err), ["fileName", "fileSize", "fileType"]);
    }

    fn messages(err: UploadError) -> Vec<String> {
        match err {
            UploadError::Validation { errors, .. } => {
                errors.into_iter().map(|e| e.message).collect()
            }
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_size_bounds() {
        let err = validate_intent(&UploadIntent::new("a", "b", MAX_FILE_SIZE + 1)).unwrap_err();
        assert_eq!(messages(err), ["文件大小不能超过10MB"]);

        let err = validate_intent(&UploadIntent::new("a", "b", -5)).unwrap_err();
        assert_eq!(messages(err), ["文件大小必须大于0"]);

        let err = validate_intent(&UploadIntent::new("a", "b", 0)).unwrap_err();
        assert_eq!(fields(err), ["fileSize"]);
    }

    #[test]
    fn test_missing_fields_reported() {
        let intent: UploadIntent = serde_json::from_str("{}").expect("empty object");
        let err = validate_intent(&intent).unwrap_err();
        match err {
            UploadError::Validation { errors, .. } => {
                let found: Vec<_> = errors
                    .iter()
                    .map(|e| (e.field.as_str(), e.code.as_str(), e.message.as_str()))
                    .collect();
                assert_eq!(
                    found,
                    [
                        ("fileName", "length", "文件名不能为空"),
                        ("fileSize", "required", "文件大小不能为空"),
                        ("fileType", "length", "文件类型不能为空"),
                    ]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_field_messages() {
        let err = validate_intent(&UploadIntent::new("", "image/png", 10)).unwrap_err();
        match err {
            UploadError::Validation { message, errors } => {
                assert_eq!(message, "请求参数错误");
                assert_eq!(errors[0].message, "文件名不能为空");
                assert_eq!(errors[0].code, "length");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_batch_envelope_bounds() {
        let empty = BatchUploadRequest { files: vec![] };
        assert_eq!(fields(validate_batch_upload(&empty).unwrap_err()), ["files"]);

        let eleven = BatchUploadRequest {
            files: vec![UploadIntent::new("a.png", "image/png", 1); 11],
        };
        assert_eq!(fields(validate_batch_upload(&eleven).unwrap_err()), ["files"]);

        let ten = BatchUploadRequest {
            files: vec![UploadIntent::new("a.png", "image/png", 1); 10],
        };
        assert!(validate_batch_upload(&ten).is_ok());
    }

    #[test]
    fn test_batch_element_paths() {
        let request = BatchUploadRequest {
            files: vec![
                UploadIntent::new("a.png", "image/png", 1),
                UploadIntent::new("b.png", "", 1),
                UploadIntent::new("c.png", "image/png", 0),
            ],
        };
        let err = validate_batch_upload(&request).unwrap_err();
        assert_eq!(fields(err), ["files[1].fileType", "files[2].fileSize"]);
    }

    #[test]
    fn test_batch_delete_bounds() {
        let empty = BatchDeleteRequest { file_names: vec![] };
        assert!(validate_batch_delete(&empty).is_err());

        let too_many = BatchDeleteRequest {
            file_names: vec!["uploads/x".to_string(); 101],
        };
        assert!(validate_batch_delete(&too_many).is_err());

        let max = BatchDeleteRequest {
            file_names: vec!["uploads/x".to_string(); 100],
        };
        assert!(validate_batch_delete(&max).is_ok());
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("file_size"), "fileSize");
        assert_eq!(camel_case("fileSize"), "fileSize");
        assert_eq!(camel_case("files"), "files");
    }

    proptest! {
        #[test]
        fn prop_size_validation(size in -100i64..20_000_000) {
            let result = validate_intent(&UploadIntent::new("a.png", "image/png", size));
            if size > 0 && size <= MAX_FILE_SIZE {
                prop_assert!(result.is_ok());
            } else {
                let rejected = matches!(result, Err(UploadError::Validation { .. }));
                prop_assert!(rejected);
            }
        }
    }
}
