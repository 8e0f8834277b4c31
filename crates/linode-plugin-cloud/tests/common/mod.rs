use async_trait::async_trait;
use linode_plugin_cloud::instance::{BackupsInfo, InstanceSpecs};
use linode_plugin_cloud::{
    CloudError, ContextRecorder, CreateInstanceRequest, InstanceId, InstanceStatus,
    LinodeProvider, NodeContext, RemoteInstance, ResourceContext, ResourceProperties, Result,
};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

/// First id handed out by `FakeProvider::create_instance`
pub const FIRST_CREATED_ID: u64 = 1000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List,
    Get(u64),
    Create(String),
    Boot(u64),
    Shutdown(u64),
    Destroy(u64),
    Status(u64),
    Images,
    Regions,
    Types(String),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Call::Create(_) | Call::Boot(_) | Call::Shutdown(_) | Call::Destroy(_)
        )
    }
}

struct Inner {
    instances: Vec<RemoteInstance>,
    status_scripts: HashMap<u64, VecDeque<InstanceStatus>>,
    calls: Vec<Call>,
    next_id: u64,
    created_status: InstanceStatus,
    sticky_after_destroy: bool,
    list_error: Option<u16>,
    get_error: Option<u16>,
    last_request: Option<CreateInstanceRequest>,
}

/// In-memory provider with scripted statuses and a call log
pub struct FakeProvider {
    inner: Mutex<Inner>,
}

#[allow(dead_code)]
impl FakeProvider {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                instances: Vec::new(),
                status_scripts: HashMap::new(),
                calls: Vec::new(),
                next_id: FIRST_CREATED_ID,
                created_status: InstanceStatus::Running,
                sticky_after_destroy: false,
                list_error: None,
                get_error: None,
                last_request: None,
            }),
        }
    }

    pub fn with_instance(self, id: u64, status: InstanceStatus) -> Self {
        self.inner
            .lock()
            .unwrap()
            .instances
            .push(instance(id, &format!("linode-{}", id), status));
        self
    }

    /// Statuses returned by successive `get_status` calls; the last one sticks
    pub fn with_status_script(self, id: u64, statuses: &[InstanceStatus]) -> Self {
        self.inner
            .lock()
            .unwrap()
            .status_scripts
            .insert(id, statuses.iter().copied().collect());
        self
    }

    pub fn with_created_status(self, status: InstanceStatus) -> Self {
        self.inner.lock().unwrap().created_status = status;
        self
    }

    /// `destroy` succeeds but the linode keeps being listed
    pub fn sticky_after_destroy(self) -> Self {
        self.inner.lock().unwrap().sticky_after_destroy = true;
        self
    }

    pub fn failing_list(self, status: u16) -> Self {
        self.inner.lock().unwrap().list_error = Some(status);
        self
    }

    pub fn failing_get(self, status: u16) -> Self {
        self.inner.lock().unwrap().get_error = Some(status);
        self
    }

    pub fn set_status_script(&self, id: u64, statuses: &[InstanceStatus]) {
        self.inner
            .lock()
            .unwrap()
            .status_scripts
            .insert(id, statuses.iter().copied().collect());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().unwrap().calls.clone()
    }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    pub fn last_request(&self) -> Option<CreateInstanceRequest> {
        self.inner.lock().unwrap().last_request.clone()
    }

    fn record(&self, call: Call) {
        self.inner.lock().unwrap().calls.push(call);
    }
}

#[async_trait]
impl LinodeProvider for FakeProvider {
    async fn list_instances(&self) -> Result<Vec<RemoteInstance>> {
        self.record(Call::List);
        let inner = self.inner.lock().unwrap();
        if let Some(status) = inner.list_error {
            return Err(CloudError::provider(Some(status), "list failed"));
        }
        Ok(inner.instances.clone())
    }

    async fn get_instance(&self, id: InstanceId) -> Result<RemoteInstance> {
        self.record(Call::Get(id.get()));
        let inner = self.inner.lock().unwrap();
        if let Some(status) = inner.get_error {
            return Err(CloudError::provider(Some(status), "get failed"));
        }
        inner
            .instances
            .iter()
            .find(|i| i.id == id)
            .cloned()
            .ok_or_else(|| CloudError::provider(Some(404), "Not found"))
    }

    async fn create_instance(&self, request: &CreateInstanceRequest) -> Result<RemoteInstance> {
        self.record(Call::Create(request.label.clone()));
        let mut inner = self.inner.lock().unwrap();
        let id = inner.next_id;
        inner.next_id += 1;

        let mut created = instance(id, &request.label, inner.created_status);
        created.region = request.region.clone();
        created.image = Some(request.image.clone());
        created.instance_type = Some(request.instance_type.clone());
        created.backups.enabled = request.backups_enabled;
        inner.instances.push(created.clone());
        inner.last_request = Some(request.clone());
        Ok(created)
    }

    async fn boot(&self, id: InstanceId) -> Result<()> {
        self.record(Call::Boot(id.get()));
        Ok(())
    }

    async fn shutdown(&self, id: InstanceId) -> Result<()> {
        self.record(Call::Shutdown(id.get()));
        Ok(())
    }

    async fn destroy(&self, id: InstanceId) -> Result<()> {
        self.record(Call::Destroy(id.get()));
        let mut inner = self.inner.lock().unwrap();
        if !inner.sticky_after_destroy {
            inner.instances.retain(|i| i.id != id);
        }
        Ok(())
    }

    async fn get_status(&self, id: InstanceId) -> Result<InstanceStatus> {
        self.record(Call::Status(id.get()));
        let mut inner = self.inner.lock().unwrap();
        if let Some(script) = inner.status_scripts.get_mut(&id.get()) {
            let status = if script.len() > 1 {
                script.pop_front()
            } else {
                script.front().copied()
            };
            if let Some(status) = status {
                return Ok(status);
            }
        }
        inner
            .instances
            .iter()
            .find(|i| i.id == id)
            .map(|i| i.status)
            .ok_or_else(|| CloudError::provider(Some(404), "Not found"))
    }

    async fn fetch_images(&self) -> Result<Vec<String>> {
        self.record(Call::Images);
        Ok(vec!["linode/debian12".to_string(), "linode/ubuntu24.04".to_string()])
    }

    async fn fetch_regions(&self) -> Result<Vec<String>> {
        self.record(Call::Regions);
        Ok(vec!["ap-south".to_string(), "us-east".to_string()])
    }

    async fn fetch_instance_types(&self, region: &str) -> Result<Vec<String>> {
        self.record(Call::Types(region.to_string()));
        Ok(vec!["g6-nanode-1".to_string(), "g6-standard-1".to_string()])
    }
}

pub fn instance(id: u64, label: &str, status: InstanceStatus) -> RemoteInstance {
    RemoteInstance {
        id: InstanceId::new(id),
        label: label.to_string(),
        image: Some("linode/debian12".to_string()),
        instance_type: Some("g6-nanode-1".to_string()),
        region: "us-east".to_string(),
        specs: InstanceSpecs {
            disk: 25600,
            memory: 1024,
            vcpus: 1,
        },
        tags: vec![],
        created: None,
        backups: BackupsInfo { enabled: false },
        status,
        ipv4: vec!["203.0.113.10".to_string()],
    }
}

/// Recorder that keeps everything in memory and counts writes
#[derive(Default)]
pub struct MemoryRecorder {
    pub resource_id: Option<InstanceId>,
    pub context: Option<ResourceContext>,
    pub properties: Option<ResourceProperties>,
    pub creation_writes: usize,
    pub property_writes: usize,
}

#[allow(dead_code)]
impl MemoryRecorder {
    pub fn with_resource_id(id: u64) -> Self {
        Self {
            resource_id: Some(InstanceId::new(id)),
            ..Default::default()
        }
    }
}

impl ContextRecorder for MemoryRecorder {
    fn resource_id(&self) -> Result<Option<InstanceId>> {
        Ok(self.resource_id)
    }

    fn record_resource_id(&mut self, id: InstanceId) -> Result<()> {
        self.resource_id = Some(id);
        Ok(())
    }

    fn resource_context(&self) -> Option<ResourceContext> {
        self.context.clone()
    }

    fn record_creation(&mut self, context: ResourceContext) -> Result<()> {
        self.context = Some(context);
        self.creation_writes += 1;
        Ok(())
    }

    fn record_properties(&mut self, properties: ResourceProperties) -> Result<()> {
        self.properties = Some(properties);
        self.property_writes += 1;
        Ok(())
    }

    fn retract(&mut self) -> Result<()> {
        self.resource_id = None;
        self.context = None;
        self.properties = None;
        Ok(())
    }
}

pub fn node() -> NodeContext {
    NodeContext {
        node_instance_id: "vm_x7k2p9".to_string(),
        node_id: "vm".to_string(),
        deployment_id: "staging".to_string(),
        blueprint_id: "web-tier".to_string(),
        retry_number: 0,
    }
}
