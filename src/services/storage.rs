use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use sha2::{Digest, Sha256};

use crate::core::config::Settings;

#[derive(Debug, Clone)]
pub(crate) struct StorageService {
    client: Client,
    bucket: String,
}

impl StorageService {
    pub(crate) async fn from_settings(settings: &Settings) -> anyhow::Result<Option<Self>> {
        if settings.s3().endpoint.is_empty()
            || settings.s3().access_key.is_empty()
            || settings.s3().secret_key.is_empty()
        {
            return Ok(None);
        }

        let creds = Credentials::new(
            settings.s3().access_key.clone(),
            settings.s3().secret_key.clone(),
            None,
            None,
            "mentora-uploads",
        );

        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(settings.s3().endpoint.clone())
            .region(aws_config::Region::new(settings.s3().region.clone()))
            .credentials_provider(creds)
            .load()
            .await;

        let client = Client::new(&config);

        Ok(Some(Self { client, bucket: settings.s3().bucket.clone() }))
    }

    /// Uploads one accepted file under its content-addressed key and returns
    /// that key.
    pub(crate) async fn store_upload(
        &self,
        student_id: &str,
        filename: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> anyhow::Result<String> {
        let key = upload_key(student_id, filename, bytes);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .content_type(content_type)
            .body(ByteStream::from(bytes.to_vec()))
            .send()
            .await?;

        Ok(key)
    }
}

/// Content-addressed object key. Identical bytes from the same student map
/// to the same key, so re-uploads overwrite instead of piling up.
pub(crate) fn upload_key(student_id: &str, filename: &str, bytes: &[u8]) -> String {
    let hash = hex::encode(Sha256::digest(bytes));
    format!("submissions/{student_id}/{}/{}", &hash[..16], sanitize_filename(filename))
}

fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_key_is_deterministic() {
        let a = upload_key("student-1", "notes.pdf", b"same bytes");
        let b = upload_key("student-1", "notes.pdf", b"same bytes");
        assert_eq!(a, b);
        assert!(a.starts_with("submissions/student-1/"));
        assert!(a.ends_with("/notes.pdf"));
    }

    #[test]
    fn upload_key_changes_with_content() {
        let a = upload_key("student-1", "notes.pdf", b"one");
        let b = upload_key("student-1", "notes.pdf", b"two");
        assert_ne!(a, b);
    }

    #[test]
    fn filenames_are_sanitized() {
        let key = upload_key("student-1", "my file (final).pdf", b"x");
        assert!(key.ends_with("/my_file__final_.pdf"));
    }
}
