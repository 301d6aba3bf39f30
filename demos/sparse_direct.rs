use parlu::{Control, CscMatrix, LinearSolver, LuContext, Status};
use rand::Rng;

fn main() {
    let n = 500;
    // random sparse matrix with a strong subdiagonal, so pivoting kicks in
    let mut rng = rand::thread_rng();
    let mut triplets = Vec::new();
    for j in 0..n {
        triplets.push((j, j, rng.gen_range(0.1..1.0)));
        if j + 1 < n {
            triplets.push((j + 1, j, 2.0));
        }
        for _ in 0..3 {
            triplets.push((rng.gen_range(0..n), j, rng.gen_range(-1.0..1.0)));
        }
    }
    let a = CscMatrix::from_triplets(n, n, &triplets).unwrap();
    let b: Vec<f64> = (0..n).map(|_| rng.gen_range(-1.0..1.0)).collect();
    let mut x = vec![0.0; n];

    let mut lu = LuContext::new(Control::default()).unwrap();
    match LinearSolver::solve(&mut lu, &a, &b, &mut x) {
        Ok(stats) => println!(
            "residual = {:.3e}, rcond = {:.3e}",
            stats.final_residual, stats.rcond
        ),
        Err(e) => println!("solve failed: {e} (info {})", e.info_code()),
    }

    if let Some(num) = lu.numeric() {
        if num.status() == Status::Success {
            println!(
                "{} fronts, nnz(L) = {}, nnz(U) = {}, {} off-diagonal pivots",
                num.nfronts(),
                num.lnz(),
                num.unz(),
                num.off_diagonal_pivots()
            );
        }
    }
}
