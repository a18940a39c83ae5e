/// Benchmark of decomposition versus per-rank reconstruction.
///
/// Shows how much of a rank change is saved by reusing cached factors:
/// the SVD runs once per image, while every new rank only pays for the
/// truncated product and normalization.
use std::time::{Duration, Instant};

use svd_core::IntensityMatrix;
use svd_image_compress::CompressionSession;

fn main() {
    println!("Cached-Factor SVD Benchmark");
    println!("═══════════════════════════");

    for &(width, height) in &[(64usize, 64usize), (128, 96), (256, 192)] {
        let image = synthetic_image(width, height);
        let ranks = [1, 5, 10, image.max_rank() / 2, image.max_rank()];

        let started = Instant::now();
        let session = match CompressionSession::new(image) {
            Ok(session) => session,
            Err(err) => {
                eprintln!("{}x{}: {}", width, height, err);
                continue;
            }
        };
        let decompose = started.elapsed();

        let mut per_rank = Duration::ZERO;
        for &rank in &ranks {
            let started = Instant::now();
            if let Err(err) = session.evaluate(rank) {
                eprintln!("{}x{} rank {}: {}", width, height, rank, err);
            }
            per_rank += started.elapsed();
        }
        let per_rank_avg = per_rank / ranks.len() as u32;

        println!();
        println!("{}x{} image:", width, height);
        println!("  Decomposition:      {:>9.2} ms", ms(decompose));
        println!("  Evaluation (avg):   {:>9.2} ms", ms(per_rank_avg));
        println!(
            "  Recomputing per rank would cost {:.1}x more",
            (ms(decompose) + ms(per_rank_avg)) / ms(per_rank_avg).max(1e-6)
        );
    }
}

fn ms(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Smooth gradient with a checker overlay, so the spectrum has both a few
/// dominant and many small singular values.
fn synthetic_image(width: usize, height: usize) -> IntensityMatrix {
    let pixels: Vec<u8> = (0..height)
        .flat_map(|y| {
            (0..width).map(move |x| {
                let gradient = (x * 160 / width + y * 60 / height) as u8;
                let checker = if (x / 8 + y / 8) % 2 == 0 { 30 } else { 0 };
                gradient.saturating_add(checker)
            })
        })
        .collect();
    IntensityMatrix::from_gray_bytes(height, width, &pixels)
        .expect("synthetic buffer matches its dimensions")
}
