//! `workflow.yml`: the abstract workflow.
//!
//! Jobs name a transformation and list the logical files they read and
//! write. When dependency inference is on, a job that reads a file
//! depends on the job that writes it.

use cryoflow_common_core::{JobId, Lfn};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use tracing::debug;

use crate::catalog::{to_versioned_yaml, CatalogFile};
use crate::error::{PegasusError, Result};

/// A logical file used by jobs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct File {
    lfn: Lfn,
}

impl File {
    /// Create a file, validating its logical name.
    pub fn new(lfn: impl Into<String>) -> Result<Self> {
        Ok(Self {
            lfn: Lfn::new(lfn)?,
        })
    }

    /// The logical name.
    pub fn lfn(&self) -> &Lfn {
        &self.lfn
    }
}

impl From<Lfn> for File {
    fn from(lfn: Lfn) -> Self {
        Self { lfn }
    }
}

/// A job argument: literal text or a file, rendered as its logical name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    Text(String),
    File(Lfn),
}

impl Arg {
    /// The argument as it appears on the command line.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(s) => s,
            Self::File(lfn) => lfn.as_str(),
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&File> for Arg {
    fn from(file: &File) -> Self {
        Self::File(file.lfn.clone())
    }
}

/// Link direction of a file use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Input,
    Output,
}

/// Handling of an output file once the job finishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputOptions {
    /// Copy the file to the output site.
    pub stage_out: bool,
    /// Record the staged copy in the replica catalog.
    pub register_replica: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            stage_out: true,
            register_replica: true,
        }
    }
}

impl OutputOptions {
    /// Keep the file in scratch only.
    pub fn intermediate() -> Self {
        Self {
            stage_out: false,
            register_replica: false,
        }
    }

    /// Stage the file out without registering it.
    pub fn staged_unregistered() -> Self {
        Self {
            stage_out: true,
            register_replica: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
struct Use {
    lfn: Lfn,
    #[serde(rename = "type")]
    link: LinkType,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage_out: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    register_replica: Option<bool>,
}

/// A single invocation of a transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    transformation: String,
    args: Vec<Arg>,
    uses: Vec<Use>,
}

impl Job {
    /// Create a job running `transformation`.
    pub fn new(transformation: impl Into<String>) -> Self {
        Self {
            transformation: transformation.into(),
            args: Vec::new(),
            uses: Vec::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<Arg>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments of one kind.
    pub fn args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<Arg>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Declare an input file.
    pub fn input(mut self, file: &File) -> Self {
        self.uses.push(Use {
            lfn: file.lfn.clone(),
            link: LinkType::Input,
            stage_out: None,
            register_replica: None,
        });
        self
    }

    /// Declare an output file.
    pub fn output(mut self, file: &File, options: OutputOptions) -> Self {
        self.uses.push(Use {
            lfn: file.lfn.clone(),
            link: LinkType::Output,
            stage_out: Some(options.stage_out),
            register_replica: Some(options.register_replica),
        });
        self
    }

    /// Transformation name.
    pub fn transformation(&self) -> &str {
        &self.transformation
    }

    /// Arguments in order.
    pub fn arguments(&self) -> &[Arg] {
        &self.args
    }

    /// The command line as strings.
    pub fn argument_strings(&self) -> Vec<&str> {
        self.args.iter().map(Arg::as_str).collect()
    }

    /// Logical files read by the job.
    pub fn inputs(&self) -> impl Iterator<Item = &Lfn> {
        self.uses_of(LinkType::Input).map(|u| &u.lfn)
    }

    /// Logical files written by the job.
    pub fn outputs(&self) -> impl Iterator<Item = &Lfn> {
        self.uses_of(LinkType::Output).map(|u| &u.lfn)
    }

    /// Output handling for `lfn`, if the job writes it.
    pub fn output_options(&self, lfn: &Lfn) -> Option<OutputOptions> {
        self.uses_of(LinkType::Output)
            .find(|u| &u.lfn == lfn)
            .map(|u| OutputOptions {
                stage_out: u.stage_out.unwrap_or(true),
                register_replica: u.register_replica.unwrap_or(true),
            })
    }

    fn uses_of(&self, link: LinkType) -> impl Iterator<Item = &Use> {
        self.uses.iter().filter(move |u| u.link == link)
    }
}

#[derive(Serialize)]
struct JobDocument<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    name: &'a str,
    id: JobId,
    arguments: Vec<&'a str>,
    uses: &'a [Use],
}

#[derive(Serialize)]
struct Dependency {
    id: JobId,
    children: Vec<JobId>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WorkflowDocument<'a> {
    name: &'a str,
    jobs: Vec<JobDocument<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    job_dependencies: Vec<Dependency>,
}

/// An abstract workflow: jobs plus the edges between them.
#[derive(Debug, Clone)]
pub struct Workflow {
    name: String,
    infer_dependencies: bool,
    jobs: BTreeMap<JobId, Job>,
    producers: HashMap<Lfn, JobId>,
    explicit: BTreeMap<JobId, BTreeSet<JobId>>,
    next_id: JobId,
}

impl Workflow {
    /// Create an empty workflow.
    pub fn new(name: impl Into<String>, infer_dependencies: bool) -> Self {
        Self {
            name: name.into(),
            infer_dependencies,
            jobs: BTreeMap::new(),
            producers: HashMap::new(),
            explicit: BTreeMap::new(),
            next_id: JobId::from_index(1),
        }
    }

    /// Workflow name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Add a job and return its id.
    ///
    /// Fails if the job lists a file twice, or writes a file another job
    /// already writes.
    pub fn add_job(&mut self, job: Job) -> Result<JobId> {
        let mut seen = BTreeSet::new();
        for u in &job.uses {
            if !seen.insert(&u.lfn) {
                return Err(PegasusError::DuplicateUse {
                    job: job.transformation.clone(),
                    lfn: u.lfn.clone(),
                });
            }
        }

        let id = self.next_id;
        for lfn in job.outputs() {
            if let Some(first) = self.producers.get(lfn) {
                return Err(PegasusError::MultipleProducers {
                    lfn: lfn.clone(),
                    first: *first,
                    second: id,
                });
            }
        }
        for lfn in job.outputs() {
            self.producers.insert(lfn.clone(), id);
        }

        debug!(%id, transformation = %job.transformation, "added job");
        self.jobs.insert(id, job);
        self.next_id = id.next();
        Ok(id)
    }

    /// Add an explicit edge `parent -> child`.
    pub fn add_dependency(&mut self, parent: JobId, child: JobId) -> Result<()> {
        for id in [parent, child] {
            if !self.jobs.contains_key(&id) {
                return Err(PegasusError::UnknownJob(id));
            }
        }
        self.explicit.entry(parent).or_default().insert(child);
        Ok(())
    }

    /// Look up a job.
    pub fn job(&self, id: JobId) -> Option<&Job> {
        self.jobs.get(&id)
    }

    /// Jobs in id order.
    pub fn jobs(&self) -> impl Iterator<Item = (JobId, &Job)> {
        self.jobs.iter().map(|(id, job)| (*id, job))
    }

    /// Number of jobs.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// No jobs added.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Job writing `lfn`, if any.
    pub fn producer(&self, lfn: &Lfn) -> Option<JobId> {
        self.producers.get(lfn).copied()
    }

    /// Files read by some job but written by none. These must be in the
    /// replica catalog.
    pub fn raw_inputs(&self) -> BTreeSet<&Lfn> {
        self.jobs
            .values()
            .flat_map(Job::inputs)
            .filter(|lfn| !self.producers.contains_key(*lfn))
            .collect()
    }

    /// All edges, explicit plus inferred, keyed by parent.
    pub fn dependencies(&self) -> BTreeMap<JobId, BTreeSet<JobId>> {
        let mut edges = self.explicit.clone();
        if self.infer_dependencies {
            for (child, job) in &self.jobs {
                for lfn in job.inputs() {
                    if let Some(parent) = self.producers.get(lfn) {
                        edges.entry(*parent).or_default().insert(*child);
                    }
                }
            }
        }
        edges
    }

    /// Parents of `id`.
    pub fn parents(&self, id: JobId) -> BTreeSet<JobId> {
        self.dependencies()
            .into_iter()
            .filter(|(_, children)| children.contains(&id))
            .map(|(parent, _)| parent)
            .collect()
    }

    /// Jobs ordered so every parent precedes its children. Ties resolve by id.
    pub fn topological_order(&self) -> Result<Vec<JobId>> {
        let edges = self.dependencies();
        let mut in_degree: BTreeMap<JobId, usize> = self.jobs.keys().map(|id| (*id, 0)).collect();
        for children in edges.values() {
            for child in children {
                *in_degree.entry(*child).or_default() += 1;
            }
        }

        let mut ready: VecDeque<JobId> = in_degree
            .iter()
            .filter(|(_, degree)| **degree == 0)
            .map(|(id, _)| *id)
            .collect();
        let mut order = Vec::with_capacity(self.jobs.len());

        while let Some(id) = ready.pop_front() {
            order.push(id);
            if let Some(children) = edges.get(&id) {
                for child in children {
                    let degree = in_degree.entry(*child).or_default();
                    *degree -= 1;
                    if *degree == 0 {
                        ready.push_back(*child);
                    }
                }
            }
        }

        if order.len() != self.jobs.len() {
            let stuck = in_degree
                .into_iter()
                .find(|(_, degree)| *degree > 0)
                .map(|(id, _)| id)
                .unwrap_or(self.next_id);
            return Err(PegasusError::Cycle(stuck));
        }
        Ok(order)
    }

    /// Check the graph is acyclic.
    pub fn validate(&self) -> Result<()> {
        self.topological_order().map(|_| ())
    }
}

impl CatalogFile for Workflow {
    fn file_name(&self) -> &'static str {
        "workflow.yml"
    }

    fn render(&self) -> Result<String> {
        self.validate()?;

        let doc = WorkflowDocument {
            name: &self.name,
            jobs: self
                .jobs
                .iter()
                .map(|(id, job)| JobDocument {
                    kind: "job",
                    name: &job.transformation,
                    id: *id,
                    arguments: job.argument_strings(),
                    uses: &job.uses,
                })
                .collect(),
            job_dependencies: self
                .dependencies()
                .into_iter()
                .map(|(id, children)| Dependency {
                    id,
                    children: children.into_iter().collect(),
                })
                .collect(),
        };
        to_versioned_yaml(self.file_name(), &doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str) -> File {
        File::new(name).unwrap()
    }

    fn chain() -> (Workflow, JobId, JobId, JobId) {
        let raw = file("raw.dm4");
        let mrc = file("gain.mrc");
        let flip = file("gain.flipy.mrc");

        let mut wf = Workflow::new("test", true);
        let convert = wf
            .add_job(Job::new("dm2mrc").arg(&raw).arg(&mrc).input(&raw).output(&mrc, OutputOptions::default()))
            .unwrap();
        let clip = wf
            .add_job(
                Job::new("clip")
                    .arg("flipy")
                    .arg(&mrc)
                    .arg(&flip)
                    .input(&mrc)
                    .output(&flip, OutputOptions::default()),
            )
            .unwrap();
        let motion = wf
            .add_job(Job::new("MotionCor2").arg("-Gain").arg(&flip).input(&flip))
            .unwrap();
        (wf, convert, clip, motion)
    }

    #[test]
    fn test_ids_are_sequential() {
        let (_, a, b, c) = chain();
        assert_eq!(a.to_string(), "ID0000001");
        assert_eq!(b.to_string(), "ID0000002");
        assert_eq!(c.to_string(), "ID0000003");
    }

    #[test]
    fn test_dependencies_are_inferred_from_files() {
        let (wf, convert, clip, motion) = chain();
        let deps = wf.dependencies();
        assert_eq!(deps.get(&convert), Some(&BTreeSet::from([clip])));
        assert_eq!(deps.get(&clip), Some(&BTreeSet::from([motion])));
        assert!(deps.get(&motion).is_none());
        assert_eq!(wf.parents(motion), BTreeSet::from([clip]));
    }

    #[test]
    fn test_no_inference_when_disabled() {
        let raw = file("a");
        let out = file("b");
        let mut wf = Workflow::new("test", false);
        wf.add_job(Job::new("x").input(&raw).output(&out, OutputOptions::default()))
            .unwrap();
        wf.add_job(Job::new("y").input(&out)).unwrap();
        assert!(wf.dependencies().is_empty());
    }

    #[test]
    fn test_raw_inputs() {
        let (wf, ..) = chain();
        let raw: Vec<&str> = wf.raw_inputs().into_iter().map(Lfn::as_str).collect();
        assert_eq!(raw, vec!["raw.dm4"]);
    }

    #[test]
    fn test_multiple_producers_rejected() {
        let out = file("same.mrc");
        let mut wf = Workflow::new("test", true);
        let first = wf
            .add_job(Job::new("a").output(&out, OutputOptions::default()))
            .unwrap();
        match wf.add_job(Job::new("b").output(&out, OutputOptions::default())) {
            Err(PegasusError::MultipleProducers { first: f, .. }) => assert_eq!(f, first),
            other => panic!("Expected MultipleProducers, got {other:?}"),
        }
        assert_eq!(wf.len(), 1);
    }

    #[test]
    fn test_duplicate_use_rejected() {
        let f = file("x.mrc");
        let mut wf = Workflow::new("test", true);
        let err = wf
            .add_job(Job::new("a").input(&f).output(&f, OutputOptions::default()))
            .unwrap_err();
        assert!(matches!(err, PegasusError::DuplicateUse { .. }));
    }

    #[test]
    fn test_topological_order_and_cycles() {
        let (mut wf, convert, clip, motion) = chain();
        assert_eq!(wf.topological_order().unwrap(), vec![convert, clip, motion]);

        wf.add_dependency(motion, convert).unwrap();
        assert!(matches!(wf.validate(), Err(PegasusError::Cycle(_))));
        assert!(wf.render().is_err());
    }

    #[test]
    fn test_unknown_dependency_rejected() {
        let (mut wf, convert, ..) = chain();
        let err = wf
            .add_dependency(convert, JobId::from_index(99))
            .unwrap_err();
        assert!(matches!(err, PegasusError::UnknownJob(_)));
    }

    #[test]
    fn test_output_options() {
        let (wf, convert, ..) = chain();
        let job = wf.job(convert).unwrap();
        let opts = job.output_options(&Lfn::new("gain.mrc").unwrap()).unwrap();
        assert!(opts.stage_out && opts.register_replica);
        assert!(job.output_options(&Lfn::new("raw.dm4").unwrap()).is_none());
    }

    #[test]
    fn test_render_shape() {
        let (wf, ..) = chain();
        let value: serde_yaml::Value = serde_yaml::from_str(&wf.render().unwrap()).unwrap();

        assert_eq!(value["name"].as_str(), Some("test"));
        let job = &value["jobs"][1];
        assert_eq!(job["type"].as_str(), Some("job"));
        assert_eq!(job["name"].as_str(), Some("clip"));
        assert_eq!(job["id"].as_str(), Some("ID0000002"));
        assert_eq!(job["arguments"][0].as_str(), Some("flipy"));
        assert_eq!(job["uses"][0]["type"].as_str(), Some("input"));
        assert!(job["uses"][0].get("stageOut").is_none());
        assert_eq!(job["uses"][1]["stageOut"].as_bool(), Some(true));
        assert_eq!(job["uses"][1]["registerReplica"].as_bool(), Some(true));

        let deps = &value["jobDependencies"];
        assert_eq!(deps[0]["id"].as_str(), Some("ID0000001"));
        assert_eq!(deps[0]["children"][0].as_str(), Some("ID0000002"));
    }

    #[test]
    fn test_render_snapshot() {
        let (wf, ..) = chain();
        insta::assert_snapshot!("workflow_chain", wf.render().unwrap());
    }
}
