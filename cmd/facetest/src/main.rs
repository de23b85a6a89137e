//! facetest - Exercise tool for the face registry over synthetic signatures.
//!
//! Enrolls a set of deterministic pseudo-random face signatures, then runs
//! recognition rounds against perturbed (genuine) and unrelated (impostor)
//! queries, reporting hit and rejection rates.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use facekit_facebase::{
    BruteForceMatcher, Descriptor, DetectPolicy, Facebase, FacebaseConfig, FacebaseError,
    FeatureExtractor, Features, Keypoint,
};

/// Exercise tool for the face registry over synthetic signatures.
#[derive(Parser, Debug)]
#[command(name = "facetest")]
#[command(about = "Exercise tool for the face registry over synthetic signatures")]
struct Args {
    /// Number of faces to enroll
    #[arg(short = 'n', long, default_value_t = 20)]
    faces: usize,

    /// Descriptors per synthetic face signature
    #[arg(long, default_value_t = 120)]
    descriptors: usize,

    /// Recognition rounds (each runs one genuine and one impostor query)
    #[arg(long, default_value_t = 10)]
    queries: usize,

    /// Bits flipped per descriptor in genuine queries
    #[arg(long, default_value_t = 8)]
    noise: usize,

    /// Minimum surviving matches for a detection
    #[arg(long, default_value_t = 40)]
    threshold: usize,

    /// Return only the best face instead of all qualifying faces
    #[arg(long)]
    best: bool,

    /// Base seed for signature generation
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Output JSON report to file
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Quiet mode (less output)
    #[arg(short = 'q', long)]
    quiet: bool,

    /// Verbose output
    #[arg(short = 'v', long)]
    verbose: bool,
}

/// Deterministic stand-in for a real vision backend: the 8-byte image is
/// a little-endian seed expanded into pseudo-random keypoints and
/// descriptors.
struct SyntheticExtractor {
    descriptors_per_face: usize,
}

impl FeatureExtractor for SyntheticExtractor {
    fn extract(&self, image: &[u8]) -> Result<Features, FacebaseError> {
        if image.len() < 8 {
            return Err(FacebaseError::Extraction(format!(
                "image too short: {} bytes",
                image.len()
            )));
        }
        let mut seed_bytes = [0u8; 8];
        seed_bytes.copy_from_slice(&image[..8]);
        let seed = u64::from_le_bytes(seed_bytes);

        let mut rng = StdRng::seed_from_u64(seed);
        let keypoints = (0..self.descriptors_per_face)
            .map(|_| Keypoint {
                x: rng.gen_range(0.0..640.0),
                y: rng.gen_range(0.0..480.0),
                angle: rng.gen_range(0.0..std::f32::consts::TAU),
            })
            .collect();
        Ok(Features {
            keypoints,
            descriptors: synth_descriptors(seed, self.descriptors_per_face),
        })
    }
}

/// Expands a seed into `n` pseudo-random descriptors. Shared by the
/// extractor and the query builders so both sides see the same signature.
fn synth_descriptors(seed: u64, n: usize) -> Vec<Descriptor> {
    // Offset keeps the descriptor stream independent of the keypoint draws
    // in SyntheticExtractor.
    let mut rng = StdRng::seed_from_u64(seed ^ 0x5eed_d35c);
    (0..n)
        .map(|_| {
            let mut d = [0u8; 32];
            rng.fill(&mut d[..]);
            d
        })
        .collect()
}

fn face_image(seed: u64) -> [u8; 8] {
    seed.to_le_bytes()
}

/// A face signature with `noise` bits flipped per descriptor.
fn genuine_query(seed: u64, n: usize, noise: usize, rng: &mut StdRng) -> Vec<Descriptor> {
    let mut descriptors = synth_descriptors(seed, n);
    for d in &mut descriptors {
        for _ in 0..noise {
            let bit = rng.gen_range(0..256);
            d[bit / 8] ^= 1 << (bit % 8);
        }
    }
    descriptors
}

fn impostor_query(n: usize, rng: &mut StdRng) -> Vec<Descriptor> {
    (0..n)
        .map(|_| {
            let mut d = [0u8; 32];
            rng.fill(&mut d[..]);
            d
        })
        .collect()
}

#[derive(Debug, Serialize)]
struct RoundReport {
    round: usize,
    target: String,
    detected: Vec<String>,
    match_count: usize,
    hit: bool,
    impostor_rejected: bool,
}

#[derive(Debug, Serialize)]
struct Report {
    faces: usize,
    descriptors_per_face: usize,
    noise_bits: usize,
    detection_threshold: usize,
    policy: DetectPolicy,
    genuine_hits: usize,
    impostor_rejections: usize,
    rounds: Vec<RoundReport>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_target(false)
            .init();
    }

    if args.faces == 0 || args.queries == 0 {
        anyhow::bail!("need at least one face and one query round");
    }

    let policy = if args.best {
        DetectPolicy::Best
    } else {
        DetectPolicy::Multi
    };
    let config = FacebaseConfig {
        detection_threshold: args.threshold,
        policy,
        ..FacebaseConfig::default()
    };

    let base = Facebase::with_config(
        Box::new(SyntheticExtractor {
            descriptors_per_face: args.descriptors,
        }),
        Box::new(BruteForceMatcher::new()),
        config,
    );

    for i in 0..args.faces {
        let label = format!("face-{i:03}");
        base.add_face(&label, &face_image(args.seed + i as u64))?;
    }
    if !args.quiet {
        println!(
            "=== Enrolled {} faces, {} descriptors each ===",
            args.faces, args.descriptors
        );
    }

    let mut noise_rng = StdRng::seed_from_u64(args.seed ^ 0x0bad_cafe);
    let mut rounds = Vec::with_capacity(args.queries);
    let mut genuine_hits = 0;
    let mut impostor_rejections = 0;

    for round in 0..args.queries {
        let target_idx = round % args.faces;
        let target = format!("face-{target_idx:03}");

        let query = genuine_query(
            args.seed + target_idx as u64,
            args.descriptors,
            args.noise,
            &mut noise_rng,
        );
        let (detected, match_count) = match base.detect_descriptors(&query) {
            Ok(detections) => {
                let count = detections
                    .iter()
                    .find(|d| d.label == target)
                    .map(|d| d.match_count)
                    .unwrap_or(0);
                (
                    detections.into_iter().map(|d| d.label).collect::<Vec<_>>(),
                    count,
                )
            }
            Err(FacebaseError::NoFaceFound) => (Vec::new(), 0),
            Err(err) => return Err(err.into()),
        };
        let hit = detected.iter().any(|label| *label == target);
        if hit {
            genuine_hits += 1;
        }

        let impostor = impostor_query(args.descriptors, &mut noise_rng);
        let impostor_rejected = match base.detect_descriptors(&impostor) {
            Err(FacebaseError::NoFaceFound) => true,
            Ok(_) => false,
            Err(err) => return Err(err.into()),
        };
        if impostor_rejected {
            impostor_rejections += 1;
        }

        if !args.quiet {
            println!(
                "round {round:02}: target {target} -> {} ({} matches), impostor {}",
                if hit { "hit" } else { "MISS" },
                match_count,
                if impostor_rejected {
                    "rejected"
                } else {
                    "ACCEPTED"
                },
            );
        }

        rounds.push(RoundReport {
            round,
            target,
            detected,
            match_count,
            hit,
            impostor_rejected,
        });
    }

    if !args.quiet {
        println!(
            "\n=== {}/{} genuine hits, {}/{} impostors rejected ===",
            genuine_hits, args.queries, impostor_rejections, args.queries
        );
    }

    if let Some(output) = &args.output {
        let report = Report {
            faces: args.faces,
            descriptors_per_face: args.descriptors,
            noise_bits: args.noise,
            detection_threshold: args.threshold,
            policy,
            genuine_hits,
            impostor_rejections,
            rounds,
        };
        std::fs::write(output, serde_json::to_string_pretty(&report)?)?;
        println!("Report saved to {}", output.display());
    }

    base.close();

    if genuine_hits < args.queries || impostor_rejections < args.queries {
        anyhow::bail!(
            "recognition degraded: {}/{} hits, {}/{} rejections",
            genuine_hits,
            args.queries,
            impostor_rejections,
            args.queries
        );
    }

    Ok(())
}
