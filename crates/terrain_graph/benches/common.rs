use std::time::Duration;

use criterion::{Criterion, Throughput};
use terrain_graph::maps::MapSize;

pub const SAMPLE_SIZE: usize = 20;
pub const WARM_UP: Duration = Duration::from_secs(1);
pub const MEASUREMENT_TIME: Duration = Duration::from_secs(2);

pub const SIDES: [usize; 3] = [64, 128, 256];

pub fn default_criterion() -> Criterion {
    Criterion::default()
        .configure_from_args()
        .sample_size(SAMPLE_SIZE)
        .warm_up_time(WARM_UP)
        .measurement_time(MEASUREMENT_TIME)
}

pub fn cells_throughput(size: MapSize) -> Throughput {
    Throughput::Elements(size.cells().max(1) as u64)
}

pub fn square(side: usize) -> MapSize {
    MapSize::square(side).expect("valid bench size")
}
