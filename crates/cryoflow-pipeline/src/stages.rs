//! Jobs for each processing stage.
//!
//! Gain preparation runs once per session. Every sampled movie then gets
//! its own chain: thumbnail copy, MotionCor2, gctf and a CTF preview.
//! Edges between the jobs are inferred from the files they share.

use cryoflow_common_config::SessionConfig;
use cryoflow_common_core::Lfn;
use cryoflow_common_log::spans::movie_span;
use cryoflow_pegasus::{File, Job, OutputOptions, ReplicaCatalog, Workflow};
use std::path::Path;
use tracing::debug;

use crate::catalogs::names;
use crate::error::{PipelineError, Result};
use crate::naming::{defect_map_output, GainNames, MovieNames};

/// Where raw inputs are registered and jobs run.
pub struct StageContext<'a> {
    pub workflow: &'a mut Workflow,
    pub replicas: &'a mut ReplicaCatalog,
    pub site: &'a str,
}

impl StageContext<'_> {
    /// Register a raw file as a replica on the execution site.
    fn register(&mut self, path: &Path) -> Result<File> {
        let lfn = Lfn::new(file_name(path)?)?;
        self.register_as(lfn, path)
    }

    fn register_as(&mut self, lfn: Lfn, path: &Path) -> Result<File> {
        self.replicas
            .add_replica(self.site, lfn.clone(), format!("file://{}", path.display()))?;
        Ok(File::from(lfn))
    }
}

/// Gain and defect map products, named for the MotionCor2 stage.
#[derive(Debug, Clone)]
pub struct GainProducts {
    pub names: GainNames,
    pub defect_map: String,
}

/// Convert the gain reference and defect map, and flip both gains on Y.
pub fn add_gain_jobs(
    ctx: &mut StageContext<'_>,
    gain_ref: &Path,
    defects_map: &Path,
) -> Result<GainProducts> {
    let raw_gain = ctx.register(gain_ref)?;
    let gain_names = GainNames::from_raw(raw_gain.lfn().as_str());

    let gain_sr = File::new(&gain_names.super_res)?;
    let gain_std = File::new(&gain_names.std)?;
    let flip_sr = File::new(&gain_names.flip_super_res)?;
    let flip_std = File::new(&gain_names.flip_std)?;

    let raw_defects = ctx.register(defects_map)?;
    let defect_name = defect_map_output(raw_defects.lfn().as_str());
    let defects = File::new(&defect_name)?;

    let staged = OutputOptions::default();
    let jobs = [
        Job::new(names::DM2MRC_GAINREF)
            .arg(&raw_gain)
            .arg(&gain_sr)
            .input(&raw_gain)
            .output(&gain_sr, staged),
        Job::new(names::NEWSTACK_GAINREF)
            .args(["-bin", "2"])
            .arg(&gain_sr)
            .arg(&gain_std)
            .input(&gain_sr)
            .output(&gain_std, staged),
        Job::new(names::CLIP_GAINREF)
            .arg("flipy")
            .arg(&gain_std)
            .arg(&flip_std)
            .input(&gain_std)
            .output(&flip_std, staged),
        Job::new(names::CLIP_GAINREF_SUPERRES)
            .arg("flipy")
            .arg(&gain_sr)
            .arg(&flip_sr)
            .input(&gain_sr)
            .output(&flip_sr, staged),
        Job::new(names::DM2MRC_DEFECT_MAP)
            .arg(&raw_defects)
            .arg(&defects)
            .input(&raw_defects)
            .output(&defects, staged),
    ];
    for job in jobs {
        ctx.workflow.add_job(job)?;
    }

    Ok(GainProducts {
        names: gain_names,
        defect_map: defect_name,
    })
}

/// Add the four jobs that process one movie.
pub fn add_movie_jobs(
    ctx: &mut StageContext<'_>,
    session: &SessionConfig,
    gain: &GainProducts,
    movie_path: &Path,
) -> Result<MovieNames> {
    let files = MovieNames::new(&file_name(movie_path)?, session);
    let _span = movie_span(&files.basename).entered();

    let movie = ctx.register(movie_path)?;
    let jpeg_path = movie_path.with_file_name(&files.jpeg);
    let jpeg_in = ctx.register_as(Lfn::new(&files.jpeg_input)?, &jpeg_path)?;

    let jpeg = File::new(&files.jpeg)?;
    let mrc = File::new(&files.motion_corrected)?;
    let dw = File::new(&files.dose_weighted)?;
    let star = File::new(&files.ctf_star)?;
    let ctf = File::new(&files.ctf)?;
    let gctf_log = File::new(&files.gctf_log)?;
    let preview = File::new(&files.ctf_preview)?;
    let flip_gain = File::new(gain.names.motioncor_gain(session.superresolution))?;

    let copy_jpeg = Job::new(names::COPY_JPEG)
        .args(["-v", "-L"])
        .arg(format!("./{}", files.jpeg_input))
        .arg(&jpeg)
        .input(&jpeg_in)
        .output(&jpeg, OutputOptions::staged_unregistered());

    let mut motioncor = Job::new(names::MOTIONCOR2)
        .arg(session.basename_extension.motioncor_flag())
        .arg(format!("./{}", files.movie))
        .arg("-OutMrc")
        .arg(&mrc)
        .arg("-Gain")
        .arg(&flip_gain)
        .arg("-Iter 7 -Tol 0.5 -RotGain 2")
        .arg("-PixSize")
        .arg(decimal(session.apix))
        .arg("-FmDose")
        .arg(decimal(session.fmdose))
        .arg("-Throw")
        .arg(session.throw.to_string())
        .arg("-Trunc")
        .arg(session.trunc.to_string())
        .args(["-Gpu 0 1 -Serial 0", "-OutStack 0", "-SumRange 0 0"]);
    if session.superresolution {
        motioncor = motioncor.arg("-FtBin 2");
    }
    let motioncor = motioncor
        .input(&movie)
        .input(&flip_gain)
        .output(&mrc, OutputOptions::intermediate())
        .output(&dw, OutputOptions::staged_unregistered());

    let gctf = Job::new(names::GCTF)
        .arg("--apix")
        .arg(decimal(session.apix))
        .arg("--kV")
        .arg(session.kev.to_string())
        .args(["--Cs", "2.7", "--ac", "0.1", "--ctfstar"])
        .arg(&star)
        .args(["--gid", "0", "--boxsize", "512"])
        .arg(&mrc)
        .input(&mrc)
        .output(&star, OutputOptions::default())
        .output(&ctf, OutputOptions::default())
        .output(&gctf_log, OutputOptions::default());

    let e2proc2d = Job::new(names::E2PROC2D)
        .arg(&ctf)
        .arg(&preview)
        .input(&ctf)
        .output(&preview, OutputOptions::default());

    for job in [copy_jpeg, motioncor, gctf, e2proc2d] {
        ctx.workflow.add_job(job)?;
    }
    debug!(movie = %files.movie, "added movie jobs");
    Ok(files)
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| PipelineError::NoFileName {
            path: path.to_path_buf(),
        })
}

/// Format like the tools expect: always with a decimal point.
fn decimal(value: f64) -> String {
    format!("{value:?}")
}
