use criterion::{Criterion, black_box, criterion_group, criterion_main};

use math_quickhull::{convex_hull, testdata};

fn bench_sphere_clouds(c: &mut Criterion) {
    let sphere_3d = testdata::random_sphere_points(3, 500, 1.0);
    c.bench_function("sphere_3d_500", |b| {
        b.iter(|| convex_hull(3, 1e-10, black_box(&sphere_3d)).unwrap())
    });

    let sphere_4d = testdata::random_sphere_points(4, 200, 1.0);
    c.bench_function("sphere_4d_200", |b| {
        b.iter(|| convex_hull(4, 1e-10, black_box(&sphere_4d)).unwrap())
    });
}

fn bench_cube_interior(c: &mut Criterion) {
    let cloud = testdata::cube_with_interior_points(3, 2.0, 5000);
    c.bench_function("cube_interior_5000", |b| {
        b.iter(|| convex_hull(3, 1e-10, black_box(&cloud)).unwrap())
    });
}

criterion_group!(benches, bench_sphere_clouds, bench_cube_interior);
criterion_main!(benches);
