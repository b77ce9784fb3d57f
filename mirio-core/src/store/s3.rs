use super::{ChunkStream, NodeStore, ObjectStat};
use crate::{MirioError, Result};
use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures_util::stream;

/// `NodeStore` over one S3-compatible endpoint (MinIO, AWS, Ceph RGW).
///
/// Path-style addressing is forced so `host:port` endpoints work without
/// virtual-host DNS.
pub struct S3NodeStore {
    endpoint: String,
    client: aws_sdk_s3::Client,
}

impl S3NodeStore {
    /// Builds the adapter for one configured node. Called once per entry
    /// in the node list.
    pub fn new(endpoint: &str, access_key: &str, secret_key: &str, region: &str) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "mirio-static");
        let endpoint_url = if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("http://{}", endpoint)
        };

        let config = aws_sdk_s3::config::Builder::new()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .endpoint_url(endpoint_url)
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        Self {
            endpoint: endpoint.to_string(),
            client: aws_sdk_s3::Client::from_conf(config),
        }
    }
}

#[async_trait]
impl NodeStore for S3NodeStore {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn put(&self, bucket: &str, name: &str, data: Bytes) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(name)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|error| {
                MirioError::Store(format!(
                    "{} put {}: {}",
                    self.endpoint,
                    name,
                    DisplayErrorContext(&error)
                ))
            })?;

        Ok(())
    }

    async fn get(&self, bucket: &str, name: &str) -> Result<ChunkStream> {
        let resp = match self.client.get_object().bucket(bucket).key(name).send().await {
            Ok(resp) => resp,
            Err(error) => {
                if let Some(service) = error.as_service_error() {
                    if service.is_no_such_key() {
                        return Err(MirioError::NotFound(name.to_string()));
                    }
                }
                return Err(MirioError::Store(format!(
                    "{} get {}: {}",
                    self.endpoint,
                    name,
                    DisplayErrorContext(&error)
                )));
            }
        };

        let endpoint = self.endpoint.clone();
        let chunks = stream::try_unfold(resp.body, move |mut body| {
            let endpoint = endpoint.clone();
            async move {
                match body.try_next().await {
                    Ok(Some(chunk)) => Ok(Some((chunk, body))),
                    Ok(None) => Ok(None),
                    Err(error) => Err(MirioError::Store(format!(
                        "{} body stream: {}",
                        endpoint, error
                    ))),
                }
            }
        });

        Ok(Box::pin(chunks))
    }

    async fn stat(&self, bucket: &str, name: &str) -> Result<ObjectStat> {
        let head = match self.client.head_object().bucket(bucket).key(name).send().await {
            Ok(head) => head,
            Err(error) => {
                if let Some(service) = error.as_service_error() {
                    if service.is_not_found() {
                        return Err(MirioError::NotFound(name.to_string()));
                    }
                }
                return Err(MirioError::Store(format!(
                    "{} stat {}: {}",
                    self.endpoint,
                    name,
                    DisplayErrorContext(&error)
                )));
            }
        };

        let last_modified = head
            .last_modified
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts.secs(), ts.subsec_nanos()))
            .ok_or_else(|| {
                MirioError::Store(format!(
                    "{} stat {}: missing last-modified",
                    self.endpoint, name
                ))
            })?;

        let version_tag = head
            .e_tag
            .unwrap_or_default()
            .trim_matches('"')
            .to_string();

        Ok(ObjectStat {
            last_modified,
            version_tag,
        })
    }

    async fn list(&self, bucket: &str) -> Result<Vec<String>> {
        let mut names = Vec::new();
        let mut continuation_token: Option<String> = None;

        // Callers see the entire bucket; pagination stays internal.
        loop {
            let mut req = self.client.list_objects_v2().bucket(bucket);
            if let Some(token) = continuation_token.take() {
                req = req.continuation_token(token);
            }

            let resp = req.send().await.map_err(|error| {
                MirioError::Store(format!(
                    "{} list {}: {}",
                    self.endpoint,
                    bucket,
                    DisplayErrorContext(&error)
                ))
            })?;

            if let Some(contents) = resp.contents {
                for object in contents {
                    if let Some(key) = object.key {
                        names.push(key);
                    }
                }
            }

            continuation_token = resp.next_continuation_token;
            if continuation_token.is_none() {
                break;
            }
        }

        Ok(names)
    }

    async fn delete(&self, bucket: &str, name: &str) -> Result<()> {
        // S3-compatible deletes are idempotent; a missing key is not reported.
        self.client
            .delete_object()
            .bucket(bucket)
            .key(name)
            .send()
            .await
            .map_err(|error| {
                MirioError::Store(format!(
                    "{} delete {}: {}",
                    self.endpoint,
                    name,
                    DisplayErrorContext(&error)
                ))
            })?;

        Ok(())
    }

    async fn bucket_exists(&self, bucket: &str) -> Result<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(error) => {
                if let Some(service) = error.as_service_error() {
                    if service.is_not_found() {
                        return Ok(false);
                    }
                }
                Err(MirioError::Store(format!(
                    "{} head bucket {}: {}",
                    self.endpoint,
                    bucket,
                    DisplayErrorContext(&error)
                )))
            }
        }
    }

    async fn create_bucket(&self, bucket: &str, region: &str) -> Result<()> {
        let mut req = self.client.create_bucket().bucket(bucket);

        // us-east-1 is the implied default and must not be sent as a
        // location constraint.
        if region != "us-east-1" {
            let constraint = BucketLocationConstraint::from(region);
            req = req.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(constraint)
                    .build(),
            );
        }

        match req.send().await {
            Ok(_) => Ok(()),
            Err(error) => {
                if let Some(service) = error.as_service_error() {
                    // Another client won the create race; the bucket is there.
                    if service.is_bucket_already_owned_by_you()
                        || service.is_bucket_already_exists()
                    {
                        return Ok(());
                    }
                }
                Err(MirioError::Store(format!(
                    "{} create bucket {}: {}",
                    self.endpoint,
                    bucket,
                    DisplayErrorContext(&error)
                )))
            }
        }
    }
}
