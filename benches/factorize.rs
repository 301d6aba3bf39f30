use criterion::{Criterion, black_box, criterion_group, criterion_main};
use parlu::{Control, CscMatrix, Scheduler, analyze, factorize};

/// Five-point Laplacian on a `k × k` grid with a small unsymmetric perturbation.
fn convection_diffusion(k: usize) -> CscMatrix {
    let idx = |i: usize, j: usize| i * k + j;
    let mut t = Vec::new();
    for i in 0..k {
        for j in 0..k {
            t.push((idx(i, j), idx(i, j), 4.0));
            if i > 0 {
                t.push((idx(i - 1, j), idx(i, j), -1.2));
            }
            if i + 1 < k {
                t.push((idx(i + 1, j), idx(i, j), -0.8));
            }
            if j > 0 {
                t.push((idx(i, j - 1), idx(i, j), -1.0));
            }
            if j + 1 < k {
                t.push((idx(i, j + 1), idx(i, j), -1.0));
            }
        }
    }
    CscMatrix::from_triplets(k * k, k * k, &t).unwrap()
}

fn bench_factorize(c: &mut Criterion) {
    let a = convection_diffusion(40);
    let n = a.ncols();
    let b: Vec<f64> = (0..n).map(|i| (i as f64).cos()).collect();
    let mut x = vec![0.0; n];

    for threads in [1, 4] {
        let control = Control::default().with_threads(threads);
        let scheduler = Scheduler::from_control(&control).unwrap();
        let symbolic = analyze(&a, &control).unwrap();

        c.bench_function(&format!("parlu factorize ({threads} threads)"), |ben| {
            ben.iter(|| {
                let _num = factorize(black_box(&a), &symbolic, &control, &scheduler).unwrap();
            })
        });

        let num = factorize(&a, &symbolic, &control, &scheduler).unwrap();
        c.bench_function(&format!("parlu solve ({threads} threads)"), |ben| {
            ben.iter(|| {
                num.solve_into(&scheduler, black_box(&b), black_box(&mut x), 1)
                    .unwrap();
            })
        });
    }

    c.bench_function("parlu analyze", |ben| {
        let control = Control::default();
        ben.iter(|| {
            let _symbolic = analyze(black_box(&a), &control).unwrap();
        })
    });
}

criterion_group!(benches, bench_factorize);
criterion_main!(benches);
