//! Downsampling of one-minute snapshots into wall-clock minute buckets

use crate::types::{parse_timestamp, Field, Observation};
use chrono::Timelike;

/// Bucket identity: UTC hour since epoch plus `minute / bucket_minutes`
type BucketKey = (i64, u32);

fn bucket_key(t: &str, bucket_minutes: u32) -> Option<BucketKey> {
    let ts = parse_timestamp(t)?;
    let hour = ts.timestamp().div_euclid(3600);
    Some((hour, ts.minute() / bucket_minutes))
}

/// Running per-field means for the bucket being filled
struct Bucket {
    key: Option<BucketKey>,
    last_t: String,
    sums: [f64; Field::COUNT],
    counts: [u32; Field::COUNT],
}

impl Bucket {
    fn start(key: Option<BucketKey>, obs: Observation) -> Self {
        let mut bucket = Self {
            key,
            last_t: String::new(),
            sums: [0.0; Field::COUNT],
            counts: [0; Field::COUNT],
        };
        bucket.add(obs);
        bucket
    }

    fn add(&mut self, obs: Observation) {
        for (i, (_, value)) in obs.fields().enumerate() {
            if let Some(v) = value {
                self.sums[i] += v;
                self.counts[i] += 1;
            }
        }
        self.last_t = obs.t;
    }

    fn finish(self) -> Observation {
        let mut out = Observation::new(self.last_t);
        for (i, field) in Field::ALL.into_iter().enumerate() {
            let mean = (self.counts[i] > 0).then(|| self.sums[i] / f64::from(self.counts[i]));
            out.set(field, mean);
        }
        out
    }
}

/// Average contiguous runs of observations sharing a wall-clock bucket.
///
/// The output timestamp of a bucket is that of its last observation and every
/// field is the simple mean of its finite values (absent if there are none).
/// A run ends as soon as the bucket key changes, so the first bucket may be
/// partial. Observations with an unparseable timestamp form their own bucket.
/// `bucket_minutes` of 0 or 1 returns the input unchanged.
pub fn resample(series: Vec<Observation>, bucket_minutes: u32) -> Vec<Observation> {
    if bucket_minutes <= 1 {
        return series;
    }

    let mut out = Vec::with_capacity(series.len() / bucket_minutes as usize + 1);
    let mut current: Option<Bucket> = None;

    for obs in series {
        let key = bucket_key(&obs.t, bucket_minutes);
        match current.as_mut() {
            Some(bucket) if key.is_some() && bucket.key == key => bucket.add(obs),
            _ => {
                if let Some(done) = current.take() {
                    out.push(done.finish());
                }
                current = Some(Bucket::start(key, obs));
            }
        }
    }

    if let Some(done) = current {
        out.push(done.finish());
    }

    out
}
