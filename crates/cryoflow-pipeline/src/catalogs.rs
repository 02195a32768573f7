//! Properties, site and transformation catalogs for the cluster.

use cryoflow_common_config::{CryoflowConfig, RunConfig};
use cryoflow_pegasus::{
    Directory, DirectoryType, Namespace, PegasusProfile, Properties, Site, SiteCatalog,
    Transformation, TransformationCatalog,
};
use std::path::Path;

use crate::error::Result;

/// Transformation names jobs refer to.
pub mod names {
    pub const DM2MRC_GAINREF: &str = "dm2mrc_gainref";
    pub const NEWSTACK_GAINREF: &str = "newstack_gainref";
    pub const CLIP_GAINREF: &str = "clip_gainref";
    pub const CLIP_GAINREF_SUPERRES: &str = "clip_gainref_superres";
    pub const DM2MRC_DEFECT_MAP: &str = "dm2mrc_defect_map";
    pub const COPY_JPEG: &str = "copy_jpeg";
    pub const MOTIONCOR2: &str = "MotionCor2";
    pub const GCTF: &str = "gctf";
    pub const E2PROC2D: &str = "e2proc2d";
}

/// Name of the submit-host site.
pub const LOCAL_SITE: &str = "local";

struct Tool {
    name: &'static str,
    wrapper: &'static str,
    cores: u32,
    runtime: u32,
    memory: Option<u32>,
    gpu: bool,
    clustered: bool,
}

const TOOLS: &[Tool] = &[
    Tool {
        name: names::DM2MRC_GAINREF,
        wrapper: "imod_dm2mrc_wrapper.sh",
        cores: 4,
        runtime: 180,
        memory: None,
        gpu: false,
        clustered: false,
    },
    Tool {
        name: names::NEWSTACK_GAINREF,
        wrapper: "imod_newstack_wrapper.sh",
        cores: 4,
        runtime: 180,
        memory: None,
        gpu: false,
        clustered: false,
    },
    Tool {
        name: names::CLIP_GAINREF,
        wrapper: "imod_clip_wrapper.sh",
        cores: 4,
        runtime: 180,
        memory: None,
        gpu: false,
        clustered: false,
    },
    Tool {
        name: names::CLIP_GAINREF_SUPERRES,
        wrapper: "imod_clip_wrapper.sh",
        cores: 4,
        runtime: 180,
        memory: None,
        gpu: false,
        clustered: false,
    },
    Tool {
        name: names::DM2MRC_DEFECT_MAP,
        wrapper: "imod_dm2mrc_wrapper.sh",
        cores: 4,
        runtime: 180,
        memory: None,
        gpu: false,
        clustered: false,
    },
    Tool {
        name: names::COPY_JPEG,
        wrapper: "cp_wrapper.sh",
        cores: 1,
        runtime: 20,
        memory: None,
        gpu: false,
        clustered: true,
    },
    Tool {
        name: names::MOTIONCOR2,
        wrapper: "motioncor2_wrapper.sh",
        cores: 4,
        runtime: 600,
        memory: Some(4192),
        gpu: true,
        clustered: true,
    },
    Tool {
        name: names::GCTF,
        wrapper: "gctf_wrapper.sh",
        cores: 4,
        runtime: 600,
        memory: Some(4192),
        gpu: true,
        clustered: true,
    },
    Tool {
        name: names::E2PROC2D,
        wrapper: "e2proc2d_wrapper.sh",
        cores: 1,
        runtime: 600,
        memory: Some(2048),
        gpu: false,
        clustered: true,
    },
];

/// `pegasus.properties` for a run.
pub fn build_properties(run: &RunConfig) -> Properties {
    let mut props = Properties::new();
    props
        .set("pegasus.metrics.app", &run.workflow_name)
        .set("pegasus.data.configuration", "sharedfs")
        .set("pegasus.transfer.links", "True")
        .set("dagman.maxjobs", run.max_jobs());
    props
}

/// Site catalog with the local site and the batch execution site.
///
/// Paths in `config` are used as given and should already be absolute.
pub fn build_sites(config: &CryoflowConfig, pegasus_home: &Path) -> Result<SiteCatalog> {
    let wf_dir = &config.paths.workflow_dir;
    let cluster = &config.cluster;

    let local = Site::new(LOCAL_SITE)
        .add_directory(Directory::local(
            DirectoryType::SharedScratch,
            wf_dir.join("local-scratch"),
        ))
        .add_directory(Directory::local(
            DirectoryType::LocalStorage,
            &config.paths.outputs_dir,
        ));

    let mut exec = Site::new(&cluster.site_name)
        .add_profile(Namespace::Condor, "grid_resource", cluster.grid_resource.as_str())
        .add_profile(Namespace::Pegasus, "style", "glite")
        .add_profile(Namespace::Pegasus, "auxillary.local", true)
        .add_profile(Namespace::Pegasus, "queue", cluster.queue.as_str())
        .add_profile(
            Namespace::Env,
            "PEGASUS_HOME",
            pegasus_home.display().to_string(),
        )
        .add_directory(Directory::local(
            DirectoryType::SharedScratch,
            wf_dir.join("scratch"),
        ));
    if let Some(project) = &cluster.project {
        exec = exec.add_profile(Namespace::Pegasus, "project", project.as_str());
    }

    let mut catalog = SiteCatalog::new();
    catalog.add_site(local)?.add_site(exec)?;
    Ok(catalog)
}

/// Transformation catalog: every wrapper script, installed on the execution site.
pub fn build_transformations(config: &CryoflowConfig) -> Result<TransformationCatalog> {
    let scripts = config.paths.scripts_dir();
    let cluster_size = config.run.cluster_size();

    let mut catalog = TransformationCatalog::new();
    for tool in TOOLS {
        let mut transformation = Transformation::new(
            tool.name,
            &config.cluster.site_name,
            scripts.join(tool.wrapper),
            false,
        )
        .add_pegasus_profile(PegasusProfile {
            cores: Some(tool.cores),
            runtime: Some(tool.runtime),
            memory: tool.memory,
            glite_arguments: tool.gpu.then(|| config.cluster.gpu_resources.clone()),
        });
        if tool.clustered {
            transformation =
                transformation.add_profile(Namespace::Pegasus, "clusters.size", cluster_size);
        }
        catalog.add_transformation(transformation)?;
    }
    Ok(catalog)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryoflow_pegasus::{CatalogFile, ProfileValue};
    use std::path::PathBuf;

    fn config() -> CryoflowConfig {
        let mut config = CryoflowConfig::default();
        config.paths.base_dir = PathBuf::from("/opt/cryoflow");
        config.paths.inputs_dir = PathBuf::from("/data/session");
        config.paths.outputs_dir = PathBuf::from("/data/outputs");
        config.paths.workflow_dir = PathBuf::from("/data/runs");
        config
    }

    #[test]
    fn test_properties_by_mode() {
        let mut run = RunConfig::default();
        let props = build_properties(&run);
        assert_eq!(props.get("pegasus.metrics.app"), Some("motioncor2"));
        assert_eq!(props.get("pegasus.data.configuration"), Some("sharedfs"));
        assert_eq!(props.get("pegasus.transfer.links"), Some("True"));
        assert_eq!(props.get("dagman.maxjobs"), Some("50"));

        run.debug = true;
        assert_eq!(build_properties(&run).get("dagman.maxjobs"), Some("5"));
    }

    #[test]
    fn test_sites() {
        let sites = build_sites(&config(), Path::new("/opt/pegasus")).unwrap();

        let local = sites.site("local").unwrap();
        let scratch = local.directory(DirectoryType::SharedScratch).unwrap();
        assert_eq!(scratch.path, PathBuf::from("/data/runs/local-scratch"));
        let storage = local.directory(DirectoryType::LocalStorage).unwrap();
        assert_eq!(storage.file_servers[0].url, "file:///data/outputs");

        let exec = sites.site("slurm").unwrap();
        assert_eq!(
            exec.profiles.get(Namespace::Condor, "grid_resource"),
            Some(&ProfileValue::from("batch slurm"))
        );
        assert_eq!(
            exec.profiles.get(Namespace::Env, "PEGASUS_HOME"),
            Some(&ProfileValue::from("/opt/pegasus"))
        );
        assert_eq!(
            exec.profiles.get(Namespace::Pegasus, "auxillary.local"),
            Some(&ProfileValue::Bool(true))
        );
        assert!(exec.profiles.get(Namespace::Pegasus, "project").is_none());
        assert_eq!(
            exec.directory(DirectoryType::SharedScratch).unwrap().path,
            PathBuf::from("/data/runs/scratch")
        );
    }

    #[test]
    fn test_sites_with_project() {
        let mut config = config();
        config.cluster.project = Some("osinski_703".to_string());
        config.cluster.site_name = "discovery".to_string();

        let sites = build_sites(&config, Path::new("/opt/pegasus")).unwrap();
        let exec = sites.site("discovery").unwrap();
        assert_eq!(
            exec.profiles.get(Namespace::Pegasus, "project"),
            Some(&ProfileValue::from("osinski_703"))
        );
    }

    #[test]
    fn test_transformations_catalog() {
        let catalog = build_transformations(&config()).unwrap();
        assert_eq!(catalog.len(), 9);
        insta::assert_snapshot!("transformations", catalog.render().unwrap());
    }

    #[test]
    fn test_debug_cluster_size() {
        let mut config = config();
        config.run.debug = true;

        let catalog = build_transformations(&config).unwrap();
        let mc2 = catalog.get(names::MOTIONCOR2).unwrap();
        assert_eq!(
            mc2.profiles.get(Namespace::Pegasus, "clusters.size"),
            Some(&ProfileValue::from(5u32))
        );
        let dm2mrc = catalog.get(names::DM2MRC_GAINREF).unwrap();
        assert!(dm2mrc.profiles.get(Namespace::Pegasus, "clusters.size").is_none());
    }
}
