use std::{collections::HashMap, io::ErrorKind, path::Path};

use axum::{body::Bytes, extract::Multipart};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
};

const IMAGE_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

/// Public path prefix the upload directory is served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// A fully buffered multipart form: text fields plus file parts.
#[derive(Debug, Default)]
pub struct FormData {
    fields: HashMap<String, String>,
    files: HashMap<String, UploadedFile>,
}

impl FormData {
    pub async fn from_multipart(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = FormData::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::bad_request(format!("invalid multipart body: {e}")))?
        {
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            match field.file_name().map(str::to_string) {
                Some(file_name) => {
                    let bytes = field
                        .bytes()
                        .await
                        .map_err(|e| AppError::bad_request(format!("invalid file part: {e}")))?;
                    // browsers send an empty part for an untouched file input
                    if !bytes.is_empty() {
                        form.files.insert(name, UploadedFile { file_name, bytes });
                    }
                }
                None => {
                    let value = field
                        .text()
                        .await
                        .map_err(|e| AppError::bad_request(format!("invalid field {name}: {e}")))?;
                    form.fields.insert(name, value);
                }
            }
        }
        Ok(form)
    }

    pub fn insert_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Trimmed value; blank counts as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        self.fields
            .get(key)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    pub fn required(&self, key: &str) -> AppResult<String> {
        self.text(key)
            .ok_or_else(|| AppError::bad_request(format!("{key} is required")))
    }

    pub fn decimal(&self, key: &str) -> AppResult<Option<Decimal>> {
        self.text(key)
            .map(|raw| {
                raw.parse::<Decimal>()
                    .map_err(|_| AppError::bad_request(format!("{key} must be a number")))
            })
            .transpose()
    }

    pub fn take_file(&mut self, key: &str) -> Option<UploadedFile> {
        self.files.remove(key)
    }
}

/// Lower-cased extension of an accepted image file name.
pub fn image_extension(file_name: &str) -> AppResult<String> {
    let ext = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or_else(|| AppError::bad_request("image file has no extension"))?;
    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(AppError::bad_request(format!(
            "unsupported image type .{ext}, expected one of {}",
            IMAGE_EXTENSIONS.join(", ")
        )))
    }
}

pub fn image_file_name(prefix: &str, ext: &str, at: DateTime<Utc>) -> String {
    format!("{prefix}-{}.{ext}", at.timestamp_millis())
}

/// Writes the image under the upload directory and returns its public URL.
pub async fn store_image(config: &AppConfig, prefix: &str, file: UploadedFile) -> AppResult<String> {
    if file.bytes.len() > config.max_upload_bytes {
        return Err(AppError::bad_request(format!(
            "image exceeds {} bytes",
            config.max_upload_bytes
        )));
    }
    let ext = image_extension(&file.file_name)?;

    fs::create_dir_all(&config.upload_dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let mut name = image_file_name(prefix, &ext, Utc::now());
    let mut handle = match create_new(&config.upload_dir.join(&name)).await {
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            let suffix = Uuid::new_v4().simple().to_string();
            name = format!("{}-{}.{ext}", name.trim_end_matches(&format!(".{ext}")), &suffix[..8]);
            create_new(&config.upload_dir.join(&name)).await
        }
        other => other,
    }
    .map_err(|e| AppError::Internal(e.into()))?;

    handle
        .write_all(&file.bytes)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    handle
        .flush()
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::debug!(file = %name, bytes = file.bytes.len(), "image stored");
    Ok(format!("{PUBLIC_PREFIX}/{name}"))
}

/// Best-effort removal of an image previously returned by [`store_image`].
pub async fn remove_image(config: &AppConfig, public_url: &str) {
    let Some(name) = public_url.strip_prefix(&format!("{PUBLIC_PREFIX}/")) else {
        return;
    };
    if name.contains('/') || name.contains("..") {
        return;
    }
    if let Err(err) = fs::remove_file(config.upload_dir.join(name)).await {
        tracing::warn!(error = %err, file = %name, "failed to remove image");
    }
}

/// Removes a just-stored image when the write that should reference it failed.
pub async fn discard_on_error<T, E>(
    config: &AppConfig,
    stored: Option<&str>,
    result: Result<T, E>,
) -> Result<T, E> {
    if result.is_err() {
        if let Some(url) = stored {
            tracing::debug!(file = %url, "discarding image of failed write");
            remove_image(config, url).await;
        }
    }
    result
}

async fn create_new(path: &Path) -> std::io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn accepts_common_image_extensions_case_insensitively() {
        assert_eq!(image_extension("mug.PNG").unwrap(), "png");
        assert_eq!(image_extension("scarf.jpeg").unwrap(), "jpeg");
        assert!(image_extension("notes.txt").is_err());
        assert!(image_extension("no_extension").is_err());
    }

    #[test]
    fn names_files_by_prefix_and_millisecond_timestamp() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(image_file_name("product", "png", at), "product-1700000000123.png");
        assert_eq!(image_file_name("seller", "jpg", at), "seller-1700000000123.jpg");
    }

    #[test]
    fn blank_text_fields_count_as_missing() {
        let mut form = FormData::default();
        form.insert_text("name", "  Vase ");
        form.insert_text("color", "   ");
        form.insert_text("price", "12.5");
        assert_eq!(form.text("name").as_deref(), Some("Vase"));
        assert!(form.text("color").is_none());
        assert!(form.required("color").is_err());
        assert_eq!(form.decimal("price").unwrap(), Some(Decimal::new(125, 1)));
        form.insert_text("price", "twelve");
        assert!(form.decimal("price").is_err());
    }

    #[tokio::test]
    async fn stores_and_removes_images_under_the_upload_dir() {
        let mut config = AppConfig::for_database("postgres://unused", "secret");
        config.upload_dir = std::env::temp_dir().join(format!("hh-upload-{}", Uuid::new_v4()));

        let url = store_image(
            &config,
            "product",
            UploadedFile {
                file_name: "vase.png".into(),
                bytes: Bytes::from_static(b"\x89PNG"),
            },
        )
        .await
        .unwrap();
        assert!(url.starts_with("/uploads/product-"));
        assert!(url.ends_with(".png"));

        let name = url.trim_start_matches("/uploads/");
        assert!(config.upload_dir.join(name).exists());
        remove_image(&config, &url).await;
        assert!(!config.upload_dir.join(name).exists());

        let _ = std::fs::remove_dir_all(&config.upload_dir);
    }

    #[tokio::test]
    async fn failed_writes_discard_the_stored_image() {
        let mut config = AppConfig::for_database("postgres://unused", "secret");
        config.upload_dir = std::env::temp_dir().join(format!("hh-upload-{}", Uuid::new_v4()));
        let image = || UploadedFile {
            file_name: "bowl.webp".into(),
            bytes: Bytes::from_static(b"RIFF"),
        };

        let kept = store_image(&config, "product", image()).await.unwrap();
        let ok: AppResult<u8> = discard_on_error(&config, Some(&kept), Ok(1)).await;
        assert_eq!(ok.unwrap(), 1);
        let kept_name = kept.trim_start_matches("/uploads/");
        assert!(config.upload_dir.join(kept_name).exists());

        let dropped = store_image(&config, "product", image()).await.unwrap();
        let failed: AppResult<u8> =
            discard_on_error(&config, Some(&dropped), Err(AppError::conflict("taken"))).await;
        assert!(matches!(failed, Err(AppError::Conflict(_))));
        let dropped_name = dropped.trim_start_matches("/uploads/");
        assert!(!config.upload_dir.join(dropped_name).exists());

        let _ = std::fs::remove_dir_all(&config.upload_dir);
    }

    #[tokio::test]
    async fn rejects_oversized_images() {
        let mut config = AppConfig::for_database("postgres://unused", "secret");
        config.max_upload_bytes = 2;
        let err = store_image(
            &config,
            "seller",
            UploadedFile {
                file_name: "me.jpg".into(),
                bytes: Bytes::from_static(b"1234"),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
