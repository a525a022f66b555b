//! Test utilities for generator tests.
//!
//! This module is only available when the `testing` feature is enabled
//! or during tests.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use ddsgen_core::{CollectingErrorHandler, FsFileProvider};
use ddsgen_model::DocumentSpec;
use eyre::{Result, WrapErr};
use tempfile::TempDir;

use crate::{Generator, config::default_bundle_dir};

/// The `Demo` model: one local data library, one referenced from
/// `shared/types.opendds`, a topic library and a DCPS library.
pub const DEMO_MODEL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<opendds:OpenDDSModel xmlns:opendds="http://www.opendds.org/modeling/schemas/OpenDDS/1.0" xmlns:types="http://www.opendds.org/modeling/schemas/Types/1.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" name="Demo">
  <libs xsi:type="types:DataLib" name="DemoTypes">
    <types xsi:type="types:Struct" name="Message">
      <fields name="id" type="long" key="true"/>
      <fields name="text" type="string"/>
    </types>
  </libs>
  <libs xsi:type="types:DataLib" href="shared/types.opendds#//@libs.0"/>
  <libs xsi:type="topics:TopicLib" name="DemoTopics">
    <topics name="MessageTopic" datatype="Message"/>
    <topics name="StatusTopic" datatype="Status"/>
  </libs>
  <libs xsi:type="opendds:DcpsLib" name="DemoDcps">
    <domains name="DemoDomain" domainId="42"/>
    <participants name="Participant" domain="DemoDomain">
      <publishers name="Pub" transportId="1">
        <writers name="MessageWriter" topic="MessageTopic"/>
      </publishers>
      <subscribers name="Sub" transportId="3">
        <readers name="StatusReader" topic="StatusTopic"/>
      </subscribers>
    </participants>
  </libs>
</opendds:OpenDDSModel>
"#;

/// Types referenced from [`DEMO_MODEL`].
pub const SHARED_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<opendds:OpenDDSModel xmlns:opendds="http://www.opendds.org/modeling/schemas/OpenDDS/1.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" name="Shared">
  <libs xsi:type="types:DataLib" name="SharedTypes">
    <types xsi:type="types:Struct" name="Status">
      <fields name="code" type="short" key="true"/>
      <fields name="detail" type="string"/>
    </types>
  </libs>
</opendds:OpenDDSModel>
"#;

/// A model without any data library.
pub const DCPS_ONLY_MODEL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<opendds:OpenDDSModel xmlns:opendds="http://www.opendds.org/modeling/schemas/OpenDDS/1.0" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" name="Bare">
  <libs xsi:type="opendds:DcpsLib" name="BareDcps">
    <participants name="Participant">
      <publishers name="Pub" transportId="1"/>
    </participants>
  </libs>
</opendds:OpenDDSModel>
"#;

/// Generation spec for [`DEMO_MODEL`], writing to `../gen`.
pub const DEMO_SPEC: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<generator:CodeGen xmlns:generator="http://www.opendds.org/modeling/schemas/Generator/1.0">
  <source name="demo.opendds"/>
  <target name="../gen"/>
  <instances>
    <instance name="default">
      <transport transportIndex="1">
        <tcp local_address="localhost:0"/>
      </transport>
      <transport transportIndex="3">
        <udp local_address="localhost:0"/>
      </transport>
    </instance>
  </instances>
</generator:CodeGen>
"#;

/// A temporary workspace holding the demo model and spec.
///
/// ```text
/// <root>/models/demo.opendds
/// <root>/models/demo.codegen
/// <root>/models/shared/types.opendds
/// <root>/gen/            (target)
/// ```
pub struct DemoWorkspace {
    temp: TempDir,
    pub provider: Arc<FsFileProvider>,
    pub handler: Arc<CollectingErrorHandler>,
}

impl DemoWorkspace {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new().wrap_err("failed to create temp dir")?;
        let provider = Arc::new(FsFileProvider::new(temp.path(), default_bundle_dir()));
        let workspace = Self {
            temp,
            provider,
            handler: Arc::new(CollectingErrorHandler::new()),
        };
        workspace.write("models/demo.opendds", DEMO_MODEL)?;
        workspace.write("models/shared/types.opendds", SHARED_TYPES)?;
        workspace.write("models/demo.codegen", DEMO_SPEC)?;
        Ok(workspace)
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn model_path(&self) -> PathBuf {
        self.root().join("models/demo.opendds")
    }

    pub fn spec_path(&self) -> PathBuf {
        self.root().join("models/demo.codegen")
    }

    pub fn target_dir(&self) -> PathBuf {
        self.root().join("gen")
    }

    /// Write a file relative to the workspace root.
    pub fn write(&self, relative: &str, content: &str) -> Result<PathBuf> {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .wrap_err_with(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, content).wrap_err_with(|| format!("failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn document_spec(&self) -> DocumentSpec {
        DocumentSpec::new(self.provider.clone(), self.handler.clone(), self.spec_path())
    }

    /// Generator over the demo spec with the bundled templates.
    pub fn generator(&self) -> Generator {
        Generator::new(self.document_spec(), self.provider.clone(), self.handler.clone())
    }

    /// Read a generated artifact.
    pub fn artifact(&self, name: &str) -> Result<String> {
        let path = self.target_dir().join(name);
        fs::read_to_string(&path).wrap_err_with(|| format!("failed to read {}", path.display()))
    }

    /// Names of the files in the target directory, sorted.
    pub fn artifacts(&self) -> Result<Vec<String>> {
        let dir = self.target_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut names = Vec::new();
        for entry in fs::read_dir(&dir).wrap_err_with(|| format!("failed to list {}", dir.display()))? {
            names.push(entry?.file_name().to_string_lossy().into_owned());
        }
        names.sort();
        Ok(names)
    }
}
