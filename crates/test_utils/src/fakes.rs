use crate::{TEST_BUCKET, rds_arn, snapshot_created_at};
use async_trait::async_trait;
use model::resource::{
    ClusterSnapshot, ExportRequest, ExportTaskDescriptor, ObjectPage, ResourceTag,
    RestoreClusterRequest,
};
use service::{BulkCopier, DatabaseControlPlane, ObjectStore, ServiceError};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlPlaneCall {
    DescribeClusterSnapshot(String),
    RestoreCluster {
        cluster: String,
        snapshot: String,
        engine: String,
    },
    CreateClusterSnapshot {
        cluster: String,
        snapshot: String,
    },
    AddTags {
        resource_arn: String,
        tags: Vec<ResourceTag>,
    },
    StartExportTask {
        task_id: String,
        source_arn: String,
        bucket: String,
        role_arn: String,
        key_arn: String,
    },
    DescribeExportTask(String),
    DeleteClusterSnapshot(String),
    DeleteCluster(String),
}

impl ControlPlaneCall {
    fn is_lookup(&self) -> bool {
        matches!(
            self,
            ControlPlaneCall::DescribeClusterSnapshot(_) | ControlPlaneCall::DescribeExportTask(_)
        )
    }
}

/// In-memory RDS which records every call.
/// Creating something that already exists fails the way RDS does.
#[derive(Default)]
pub struct RecordingControlPlane {
    calls: Mutex<Vec<ControlPlaneCall>>,
    clusters: Mutex<HashSet<String>>,
    snapshots: Mutex<HashMap<String, ClusterSnapshot>>,
    export_tasks: Mutex<HashMap<String, ExportTaskDescriptor>>,
    fail_snapshot_deletes: AtomicBool,
}

impl RecordingControlPlane {
    pub fn calls(&self) -> Vec<ControlPlaneCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Calls which would change something, in order.
    pub fn mutating_calls(&self) -> Vec<ControlPlaneCall> {
        self.calls()
            .into_iter()
            .filter(|call| !call.is_lookup())
            .collect()
    }

    pub fn started_exports(&self) -> Vec<ControlPlaneCall> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, ControlPlaneCall::StartExportTask { .. }))
            .collect()
    }

    pub fn insert_snapshot(&self, snapshot: ClusterSnapshot) {
        self.snapshots
            .lock()
            .unwrap()
            .insert(snapshot.identifier.clone(), snapshot);
    }

    pub fn insert_export_task(&self, task: ExportTaskDescriptor) {
        self.export_tasks
            .lock()
            .unwrap()
            .insert(task.export_task_identifier.clone(), task);
    }

    pub fn insert_cluster(&self, cluster: &str) {
        self.clusters.lock().unwrap().insert(cluster.to_string());
    }

    pub fn has_cluster(&self, cluster: &str) -> bool {
        self.clusters.lock().unwrap().contains(cluster)
    }

    pub fn has_snapshot(&self, snapshot: &str) -> bool {
        self.snapshots.lock().unwrap().contains_key(snapshot)
    }

    pub fn fail_snapshot_deletes(&self) {
        self.fail_snapshot_deletes.store(true, Ordering::SeqCst);
    }

    fn record(&self, call: ControlPlaneCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn already_exists(operation: &'static str, resource: &str) -> ServiceError {
    ServiceError::AlreadyExists {
        operation,
        resource: resource.to_string(),
    }
}

#[async_trait]
impl DatabaseControlPlane for RecordingControlPlane {
    async fn describe_cluster_snapshot(
        &self,
        snapshot_identifier: &str,
    ) -> Result<Option<ClusterSnapshot>, ServiceError> {
        self.record(ControlPlaneCall::DescribeClusterSnapshot(
            snapshot_identifier.to_string(),
        ));

        Ok(self.snapshots.lock().unwrap().get(snapshot_identifier).cloned())
    }

    async fn restore_cluster_from_snapshot(
        &self,
        request: RestoreClusterRequest,
    ) -> Result<String, ServiceError> {
        self.record(ControlPlaneCall::RestoreCluster {
            cluster: request.cluster_identifier.clone(),
            snapshot: request.snapshot_identifier.clone(),
            engine: request.engine.clone(),
        });

        if !self
            .clusters
            .lock()
            .unwrap()
            .insert(request.cluster_identifier.clone())
        {
            return Err(already_exists(
                "RestoreDBClusterFromSnapshot",
                &request.cluster_identifier,
            ));
        }

        Ok(rds_arn("cluster", &request.cluster_identifier))
    }

    async fn create_cluster_snapshot(
        &self,
        cluster_identifier: &str,
        snapshot_identifier: &str,
    ) -> Result<String, ServiceError> {
        self.record(ControlPlaneCall::CreateClusterSnapshot {
            cluster: cluster_identifier.to_string(),
            snapshot: snapshot_identifier.to_string(),
        });

        let mut snapshots = self.snapshots.lock().unwrap();
        if snapshots.contains_key(snapshot_identifier) {
            return Err(already_exists("CreateDBClusterSnapshot", snapshot_identifier));
        }

        let snapshot: ClusterSnapshot = ClusterSnapshot {
            identifier: snapshot_identifier.to_string(),
            arn: rds_arn("cluster-snapshot", snapshot_identifier),
            engine: Some("aurora-postgresql".to_string()),
            created_at: Some(snapshot_created_at()),
        };
        let arn: String = snapshot.arn.clone();
        snapshots.insert(snapshot_identifier.to_string(), snapshot);

        Ok(arn)
    }

    async fn add_tags(&self, resource_arn: &str, tags: &[ResourceTag]) -> Result<(), ServiceError> {
        self.record(ControlPlaneCall::AddTags {
            resource_arn: resource_arn.to_string(),
            tags: tags.to_vec(),
        });

        Ok(())
    }

    async fn start_export_task(
        &self,
        request: ExportRequest,
    ) -> Result<ExportTaskDescriptor, ServiceError> {
        self.record(ControlPlaneCall::StartExportTask {
            task_id: request.export_task_identifier.clone(),
            source_arn: request.source_arn.clone(),
            bucket: request.bucket_name.clone(),
            role_arn: request.iam_role_arn.clone(),
            key_arn: request.kms_key_id.clone(),
        });

        let mut tasks = self.export_tasks.lock().unwrap();
        if tasks.contains_key(&request.export_task_identifier) {
            return Err(already_exists("StartExportTask", &request.export_task_identifier));
        }

        let task: ExportTaskDescriptor = ExportTaskDescriptor {
            export_task_identifier: request.export_task_identifier.clone(),
            source_arn: Some(request.source_arn),
            s3_bucket: Some(request.bucket_name),
            s3_prefix: None,
            status: Some("STARTING".to_string()),
            snapshot_time: Some("2021-05-12T10:40:00Z".to_string()),
            task_start_time: None,
        };
        tasks.insert(request.export_task_identifier, task.clone());

        Ok(task)
    }

    async fn describe_export_task(
        &self,
        export_task_identifier: &str,
    ) -> Result<Option<ExportTaskDescriptor>, ServiceError> {
        self.record(ControlPlaneCall::DescribeExportTask(
            export_task_identifier.to_string(),
        ));

        Ok(self
            .export_tasks
            .lock()
            .unwrap()
            .get(export_task_identifier)
            .cloned())
    }

    async fn delete_cluster_snapshot(&self, snapshot_identifier: &str) -> Result<(), ServiceError> {
        self.record(ControlPlaneCall::DeleteClusterSnapshot(
            snapshot_identifier.to_string(),
        ));

        if self.fail_snapshot_deletes.load(Ordering::SeqCst) {
            return Err(ServiceError::Request {
                operation: "DeleteDBClusterSnapshot",
                message: "simulated failure".to_string(),
                source: "simulated failure".into(),
            });
        }

        self.snapshots.lock().unwrap().remove(snapshot_identifier);
        Ok(())
    }

    async fn delete_cluster(&self, cluster_identifier: &str) -> Result<(), ServiceError> {
        self.record(ControlPlaneCall::DeleteCluster(cluster_identifier.to_string()));

        self.clusters.lock().unwrap().remove(cluster_identifier);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectCopy {
    pub source_bucket: String,
    pub source_key: String,
    pub destination_bucket: String,
    pub destination_key: String,
}

/// Object listing served from fixed pages, linked by `page-<n>` continuation tokens.
#[derive(Default)]
pub struct RecordingObjectStore {
    pages: Vec<Vec<String>>,
    failing_keys: HashSet<String>,
    list_requests: Mutex<Vec<Option<String>>>,
    listed_prefixes: Mutex<Vec<String>>,
    copies: Mutex<Vec<ObjectCopy>>,
}

impl RecordingObjectStore {
    pub fn with_pages(pages: Vec<Vec<&str>>) -> Self {
        RecordingObjectStore {
            pages: pages
                .into_iter()
                .map(|page| page.into_iter().map(str::to_string).collect())
                .collect(),
            ..Default::default()
        }
    }

    /// Copies of these keys fail.
    pub fn failing(mut self, keys: &[&str]) -> Self {
        self.failing_keys = keys.iter().map(|key| key.to_string()).collect();
        self
    }

    /// Continuation token sent with each list request.
    pub fn list_requests(&self) -> Vec<Option<String>> {
        self.list_requests.lock().unwrap().clone()
    }

    pub fn listed_prefixes(&self) -> Vec<String> {
        self.listed_prefixes.lock().unwrap().clone()
    }

    pub fn copies(&self) -> Vec<ObjectCopy> {
        self.copies.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingObjectStore {
    async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
    ) -> Result<ObjectPage, ServiceError> {
        assert_eq!(TEST_BUCKET, bucket, "listing should target the export bucket");
        self.listed_prefixes.lock().unwrap().push(prefix.to_string());
        self.list_requests.lock().unwrap().push(continuation_token.clone());

        let index: usize = continuation_token
            .as_deref()
            .and_then(|token| token.strip_prefix("page-"))
            .and_then(|number| number.parse().ok())
            .unwrap_or(0);

        let keys: Vec<String> = self.pages.get(index).cloned().unwrap_or_default();
        let next_continuation_token: Option<String> =
            (index + 1 < self.pages.len()).then(|| format!("page-{}", index + 1));

        Ok(ObjectPage {
            keys,
            next_continuation_token,
        })
    }

    async fn copy_object_to_owner(
        &self,
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        destination_key: &str,
    ) -> Result<(), ServiceError> {
        self.copies.lock().unwrap().push(ObjectCopy {
            source_bucket: source_bucket.to_string(),
            source_key: source_key.to_string(),
            destination_bucket: destination_bucket.to_string(),
            destination_key: destination_key.to_string(),
        });

        if self.failing_keys.contains(source_key) {
            return Err(ServiceError::Request {
                operation: "CopyObject",
                message: format!("AccessDenied for {source_key}"),
                source: "AccessDenied".into(),
            });
        }

        Ok(())
    }
}

/// `BulkCopier` with a fixed result.
#[derive(Default)]
pub struct ScriptedCopier {
    fail: bool,
    calls: Mutex<Vec<(String, String)>>,
}

impl ScriptedCopier {
    pub fn succeeding() -> Self {
        ScriptedCopier::default()
    }

    pub fn failing() -> Self {
        ScriptedCopier {
            fail: true,
            ..Default::default()
        }
    }

    /// Source and destination URIs of each copy.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl BulkCopier for ScriptedCopier {
    async fn copy_prefix(&self, source_uri: &str, destination_uri: &str) -> Result<(), ServiceError> {
        self.calls
            .lock()
            .unwrap()
            .push((source_uri.to_string(), destination_uri.to_string()));

        if self.fail {
            return Err(ServiceError::Command {
                program: "aws".to_string(),
                status: "exit status: 1".to_string(),
                stderr: "upload failed".to_string(),
            });
        }

        Ok(())
    }
}
