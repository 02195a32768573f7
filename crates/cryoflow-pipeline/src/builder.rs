//! End-to-end workflow generation for one session.

use cryoflow_common_config::{ConfigLoader, CryoflowConfig, Environment};
use cryoflow_common_log::spans::{stage_span, workflow_span, Timer};
use cryoflow_pegasus::{
    write_all, CatalogFile, PlanOptions, PlanOutput, Planner, Properties, ReplicaCatalog,
    SiteCatalog, TransformationCatalog, Workflow,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::catalogs::{build_properties, build_sites, build_transformations, LOCAL_SITE};
use crate::discovery::discover_session;
use crate::error::{PipelineError, Result};
use crate::sampling::sample_movies;
use crate::stages::{add_gain_jobs, add_movie_jobs, StageContext};

/// What a generated workflow contains.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkflowSummary {
    pub workflow_name: String,
    pub workflow_dir: PathBuf,
    pub execution_site: String,
    pub debug: bool,
    pub movies_discovered: usize,
    pub movies_sampled: usize,
    pub jobs_by_transformation: BTreeMap<String, usize>,
    pub total_jobs: usize,
    /// Logical files registered in the replica catalog.
    pub replicas: usize,
}

/// The five planner inputs, ready to write.
#[derive(Debug, Clone)]
pub struct GeneratedWorkflow {
    pub properties: Properties,
    pub sites: SiteCatalog,
    pub transformations: TransformationCatalog,
    pub replicas: ReplicaCatalog,
    pub workflow: Workflow,
    pub summary: WorkflowSummary,
}

impl GeneratedWorkflow {
    /// Write all catalogs into `dir`, creating it if needed.
    pub fn write(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let catalogs: [&dyn CatalogFile; 5] = [
            &self.sites,
            &self.properties,
            &self.transformations,
            &self.replicas,
            &self.workflow,
        ];
        let written = write_all(dir, &catalogs)?;
        info!(dir = %dir.display(), files = written.len(), "wrote workflow");
        Ok(written)
    }
}

/// Result of writing and planning a workflow.
#[derive(Debug, Clone)]
pub struct Submission {
    pub summary: WorkflowSummary,
    pub files: Vec<PathBuf>,
    pub plan: PlanOutput,
}

/// Generates the pre-processing workflow for one session.
#[derive(Debug, Clone)]
pub struct PipelineWorkflow {
    config: CryoflowConfig,
    pegasus_home: Option<PathBuf>,
}

impl PipelineWorkflow {
    /// Validate `config` and resolve its paths against the current directory.
    pub fn new(mut config: CryoflowConfig) -> Result<Self> {
        ConfigLoader::default().validate(&config)?;

        let paths = &mut config.paths;
        for path in [
            &mut paths.base_dir,
            &mut paths.inputs_dir,
            &mut paths.outputs_dir,
            &mut paths.workflow_dir,
        ] {
            *path = absolute(path)?;
        }

        Ok(Self {
            config,
            pegasus_home: None,
        })
    }

    /// Use this Pegasus install instead of `$PEGASUS_HOME`.
    pub fn with_pegasus_home(mut self, path: impl Into<PathBuf>) -> Self {
        self.pegasus_home = Some(path.into());
        self
    }

    /// Configuration with resolved paths.
    pub fn config(&self) -> &CryoflowConfig {
        &self.config
    }

    /// Directory catalogs are written to and planned from.
    pub fn workflow_dir(&self) -> &Path {
        &self.config.paths.workflow_dir
    }

    fn pegasus_home(&self) -> Result<PathBuf> {
        match &self.pegasus_home {
            Some(path) => Ok(path.clone()),
            None => Ok(Environment::pegasus_home()?),
        }
    }

    /// Discover inputs and build every catalog.
    pub fn build(&self) -> Result<GeneratedWorkflow> {
        let config = &self.config;
        let _span = workflow_span(&config.run.workflow_name).entered();
        let timer = Timer::start("build_workflow");
        info!("Starting a new workflow in {} ...", self.workflow_dir().display());

        info!("Creating workflow properties...");
        let properties = build_properties(&config.run);

        info!("Creating execution sites...");
        let sites = build_sites(config, &self.pegasus_home()?)?;

        info!("Creating transformation catalog...");
        let transformations = build_transformations(config)?;

        info!("Creating replica catalog...");
        let mut replicas = ReplicaCatalog::new();

        info!("Creating pipeline workflow dag...");
        let inputs = discover_session(&config.session, &config.paths.inputs_dir)?;
        let movies = sample_movies(&inputs.movies, config.run.sample_size(), config.run.seed);

        let mut workflow = Workflow::new(&config.run.workflow_name, true);
        {
            let mut ctx = StageContext {
                workflow: &mut workflow,
                replicas: &mut replicas,
                site: &config.cluster.site_name,
            };

            let gain = {
                let _stage = stage_span("gain").entered();
                add_gain_jobs(&mut ctx, &inputs.gain_ref, &inputs.defects_map)?
            };

            let _stage = stage_span("movies").entered();
            for movie in &movies {
                add_movie_jobs(&mut ctx, &config.session, &gain, movie)?;
            }
        }
        workflow.validate()?;

        let mut jobs_by_transformation = BTreeMap::new();
        for (_, job) in workflow.jobs() {
            *jobs_by_transformation
                .entry(job.transformation().to_string())
                .or_insert(0) += 1;
        }

        let summary = WorkflowSummary {
            workflow_name: config.run.workflow_name.clone(),
            workflow_dir: config.paths.workflow_dir.clone(),
            execution_site: config.cluster.site_name.clone(),
            debug: config.run.debug,
            movies_discovered: inputs.movies.len(),
            movies_sampled: movies.len(),
            jobs_by_transformation,
            total_jobs: workflow.len(),
            replicas: replicas.len(),
        };
        let elapsed = timer.finish();
        info!(
            jobs = summary.total_jobs,
            movies = summary.movies_sampled,
            elapsed_ms = elapsed.as_millis() as u64,
            "workflow built"
        );

        Ok(GeneratedWorkflow {
            properties,
            sites,
            transformations,
            replicas,
            workflow,
            summary,
        })
    }

    /// Build and write the catalogs into the workflow directory.
    pub fn write(&self) -> Result<(GeneratedWorkflow, Vec<PathBuf>)> {
        let generated = self.build()?;
        let files = generated.write(self.workflow_dir())?;
        Ok((generated, files))
    }

    /// Planner options for this workflow.
    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            sites: vec![self.config.cluster.site_name.clone()],
            output_sites: vec![LOCAL_SITE.to_string()],
            relative_dir: Some(self.config.run.workflow_name.clone()),
            cluster: vec!["horizontal".to_string()],
            submit: true,
            ..PlanOptions::new(self.workflow_dir())
        }
    }

    /// Write the workflow, then plan and submit it.
    pub async fn submit(&self, planner: &Planner) -> Result<Submission> {
        let (generated, files) = self.write()?;
        let plan = planner.plan(&self.plan_options()).await?;
        Ok(Submission {
            summary: generated.summary,
            files,
            plan,
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(cwd.join(path))
}
