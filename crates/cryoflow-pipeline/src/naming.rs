//! File naming rules for every product derived from a session.
//!
//! All functions here are pure: they take file names (not paths) and
//! return the logical names jobs read and write.

use cryoflow_common_config::SessionConfig;

/// Suffix Gatan writes on super-resolution gain references.
const GAIN_SUFFIX: &str = "x1.m1.dm4";

/// Names in the gain reference preparation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GainNames {
    /// Raw `.dm4` gain reference as found in the session.
    pub raw: String,
    /// Super-resolution gain converted to MRC.
    pub super_res: String,
    /// Gain binned down to standard resolution.
    pub std: String,
    /// Super-resolution gain flipped on Y.
    pub flip_super_res: String,
    /// Standard-resolution gain flipped on Y.
    pub flip_std: String,
}

impl GainNames {
    /// Derive every gain product name from the raw gain file name.
    pub fn from_raw(raw: &str) -> Self {
        let stem = gain_stem(raw);
        Self {
            raw: raw.to_string(),
            super_res: format!("{stem}_SuperRes.x1.m1.mrc"),
            std: format!("{stem}_std.x1.m1.mrc"),
            flip_super_res: format!("{stem}_sr.flipy.x1.m1.mrc"),
            flip_std: format!("{stem}_std.flipy.x1.m1.mrc"),
        }
    }

    /// Gain handed to MotionCor2.
    pub fn motioncor_gain(&self, superresolution: bool) -> &str {
        if superresolution {
            &self.flip_super_res
        } else {
            &self.flip_std
        }
    }
}

/// Strip the gain suffix, falling back to a bare `.dm4`.
pub fn gain_stem(raw: &str) -> &str {
    raw.strip_suffix(GAIN_SUFFIX)
        .or_else(|| raw.strip_suffix(".dm4"))
        .unwrap_or(raw)
}

/// MRC name for a raw defect map.
pub fn defect_map_output(raw: &str) -> String {
    let stem = raw.strip_suffix(".dm4").unwrap_or(raw);
    format!("{stem}.mrc")
}

/// Names of everything produced from one movie.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MovieNames {
    pub movie: String,
    pub basename: String,
    pub motion_corrected: String,
    pub dose_weighted: String,
    pub ctf_star: String,
    pub ctf: String,
    pub gctf_log: String,
    pub ctf_preview: String,
    /// Thumbnail the microscope software saved next to the movie.
    pub jpeg: String,
    /// Logical name the thumbnail is staged in under.
    pub jpeg_input: String,
}

impl MovieNames {
    /// Derive names from a movie file name and the session's naming scheme.
    pub fn new(movie: &str, session: &SessionConfig) -> Self {
        let basename = movie_basename(
            movie,
            &session.basename_suffix,
            session.basename_extension.extension(),
        );
        let jpeg = jpeg_name(movie);

        Self {
            movie: movie.to_string(),
            motion_corrected: format!("{basename}.mrc"),
            dose_weighted: format!("{basename}_DW.mrc"),
            ctf_star: format!("{basename}.star"),
            ctf: format!("{basename}.ctf"),
            gctf_log: format!("{basename}_gctf.log"),
            ctf_preview: format!("{basename}_ctf.jpg"),
            jpeg_input: format!("{jpeg}-IN"),
            jpeg,
            basename,
        }
    }
}

/// Remove a trailing `_<suffix>.<ext>`. Names without it are returned whole.
pub fn movie_basename(movie: &str, suffix: &str, extension: &str) -> String {
    let tail = format!("_{suffix}.{extension}");
    movie.strip_suffix(&tail).unwrap_or(movie).to_string()
}

/// Thumbnail name: drop the last `_` segment and add `.jpg`.
pub fn jpeg_name(movie: &str) -> String {
    let stem = movie.rsplit_once('_').map_or("", |(head, _)| head);
    format!("{stem}.jpg")
}

#[cfg(test)]
mod tests {
    use super::*;
    use cryoflow_common_config::MovieFormat;
    use test_case::test_case;

    #[test_case("20210205_gain.x1.m1.dm4", "20210205_gain." ; "gatan suffix")]
    #[test_case("Gain_ref.dm4", "Gain_ref" ; "plain dm4")]
    #[test_case("gain.mrc", "gain.mrc" ; "unknown extension")]
    fn test_gain_stem(raw: &str, stem: &str) {
        assert_eq!(gain_stem(raw), stem);
    }

    #[test]
    fn test_gain_names() {
        let names = GainNames::from_raw("K3-gainref.x1.m1.dm4");
        assert_eq!(names.super_res, "K3-gainref._SuperRes.x1.m1.mrc");
        assert_eq!(names.std, "K3-gainref._std.x1.m1.mrc");
        assert_eq!(names.flip_super_res, "K3-gainref._sr.flipy.x1.m1.mrc");
        assert_eq!(names.flip_std, "K3-gainref._std.flipy.x1.m1.mrc");

        assert_eq!(names.motioncor_gain(false), names.flip_std);
        assert_eq!(names.motioncor_gain(true), names.flip_super_res);
    }

    #[test]
    fn test_defect_map_output() {
        assert_eq!(defect_map_output("Defects_1234.dm4"), "Defects_1234.mrc");
        assert_eq!(defect_map_output("defects.txt"), "defects.txt.mrc");
    }

    #[test]
    fn test_movie_names() {
        let session = SessionConfig::default();
        let names = MovieNames::new("FoilHole_1_Data_2_3_20210205_fractions.tiff", &session);

        assert_eq!(names.basename, "FoilHole_1_Data_2_3_20210205");
        assert_eq!(names.motion_corrected, "FoilHole_1_Data_2_3_20210205.mrc");
        assert_eq!(names.dose_weighted, "FoilHole_1_Data_2_3_20210205_DW.mrc");
        assert_eq!(names.ctf_star, "FoilHole_1_Data_2_3_20210205.star");
        assert_eq!(names.ctf, "FoilHole_1_Data_2_3_20210205.ctf");
        assert_eq!(names.gctf_log, "FoilHole_1_Data_2_3_20210205_gctf.log");
        assert_eq!(names.ctf_preview, "FoilHole_1_Data_2_3_20210205_ctf.jpg");
        assert_eq!(names.jpeg, "FoilHole_1_Data_2_3_20210205.jpg");
        assert_eq!(names.jpeg_input, "FoilHole_1_Data_2_3_20210205.jpg-IN");
    }

    #[test]
    fn test_movie_basename_uses_configured_extension() {
        let mut session = SessionConfig::default();
        session.basename_suffix = "EER".to_string();
        session.basename_extension = MovieFormat::Eer;

        let names = MovieNames::new("FoilHole_9_EER.eer", &session);
        assert_eq!(names.basename, "FoilHole_9");
    }

    #[test]
    fn test_movie_basename_is_literal() {
        // The dot before the extension must not match any character.
        assert_eq!(
            movie_basename("movie_fractionsXtiff", "fractions", "tiff"),
            "movie_fractionsXtiff"
        );
        assert_eq!(movie_basename("movie_fractions.tiff", "fractions", "tiff"), "movie");
    }

    #[test]
    fn test_jpeg_name_without_underscore() {
        assert_eq!(jpeg_name("movie.tiff"), ".jpg");
    }
}
