use async_trait::async_trait;
use bytes::Bytes;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::region::Region;
use s3::Bucket;
use tracing::debug;

use crate::{
    object_key, sanitize_filename, served_links, validate_key, ObjectStore, Removal, StoreConfig,
    StoreError, StoredObject, UploadRequest,
};

pub struct S3Store {
    bucket: Box<Bucket>,
    public_base_url: String,
}

impl std::fmt::Debug for S3Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Store").finish_non_exhaustive()
    }
}

impl S3Store {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        let region = Region::Custom {
            region: config.region.clone().unwrap_or_else(|| "us-east-1".into()),
            endpoint: config.endpoint_url.clone().unwrap_or_default(),
        };

        let credentials = Credentials::new(
            config.access_key_id.as_deref(),
            config.secret_access_key.as_deref(),
            None,
            None,
            None,
        )
        .map_err(|e| StoreError::Internal(format!("credentials: {e}")))?;

        let bucket_name = config
            .bucket
            .as_deref()
            .ok_or_else(|| StoreError::NotConfigured("bucket name required".into()))?;

        let mut bucket = Bucket::new(bucket_name, region, credentials)
            .map_err(|e| StoreError::Internal(format!("bucket: {e}")))?;
        bucket.set_path_style();

        Ok(Self {
            bucket,
            public_base_url: config.public_base_url().to_string(),
        })
    }
}

fn map_s3_error(e: S3Error) -> StoreError {
    StoreError::Internal(format!("s3: {e}"))
}

fn check_status(op: &str, key: &str, status: u16) -> Result<(), StoreError> {
    if status == 404 {
        return Err(StoreError::NotFound(key.to_string()));
    }
    if status >= 400 {
        return Err(StoreError::Internal(format!("s3 {op} {key}: status {status}")));
    }
    Ok(())
}

#[async_trait]
impl ObjectStore for S3Store {
    fn backend_name(&self) -> &'static str {
        "s3"
    }

    async fn upload(&self, request: UploadRequest) -> Result<StoredObject, StoreError> {
        let key = object_key(&request.folder, &sanitize_filename(&request.filename));
        let response = self
            .bucket
            .put_object_with_content_type(&key, &request.data, &request.content_type)
            .await
            .map_err(map_s3_error)?;
        check_status("put", &key, response.status_code())?;
        debug!(key = %key, bytes = request.data.len(), "stored s3 object");

        let (view_link, embed_link, download_link) = served_links(&self.public_base_url, &key);
        Ok(StoredObject {
            remote_id: key,
            filename: request.filename,
            view_link,
            embed_link,
            download_link,
            size_bytes: request.data.len() as i64,
        })
    }

    async fn delete(&self, remote_id: &str) -> Result<Removal, StoreError> {
        validate_key(remote_id)?;
        // S3 deletes are idempotent, so ask first to tell the two outcomes apart.
        let (_, status) = self
            .bucket
            .head_object(remote_id)
            .await
            .map_err(map_s3_error)?;
        if status == 404 {
            return Ok(Removal::NotFound);
        }
        let response = self
            .bucket
            .delete_object(remote_id)
            .await
            .map_err(map_s3_error)?;
        check_status("delete", remote_id, response.status_code())?;
        Ok(Removal::Deleted)
    }

    async fn get(&self, remote_id: &str) -> Result<Bytes, StoreError> {
        validate_key(remote_id)?;
        let response = self
            .bucket
            .get_object(remote_id)
            .await
            .map_err(map_s3_error)?;
        check_status("get", remote_id, response.status_code())?;
        Ok(Bytes::from(response.to_vec()))
    }
}
