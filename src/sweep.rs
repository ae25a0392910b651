//! The host pool and the parameter sweeps that are mapped onto it.

use serde::{Deserialize, Serialize};

use crate::{error::RunnerError, fanout::Target};

/// The ordered set of machines available for a run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostPool {
    hosts: Vec<String>,
}

impl HostPool {
    /// `prefix{i}` for every `i` in `range`, e.g. `bbchain2` ... `bbchain29` for `2..30`.
    pub fn numbered(prefix: &str, range: std::ops::Range<usize>) -> Self {
        HostPool {
            hosts: range.map(|i| format!("{}{}", prefix, i)).collect(),
        }
    }

    pub fn from_hosts(hosts: Vec<String>) -> Self {
        HostPool { hosts }
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Fail with `HostPoolExhausted` unless the pool has at least `needed` hosts.
    fn require(&self, needed: usize) -> Result<(), RunnerError> {
        if self.hosts.len() < needed {
            Err(RunnerError::HostPoolExhausted {
                needed,
                available: self.hosts.len(),
            })
        } else {
            Ok(())
        }
    }
}

/// One benchmark invocation on one host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub host: String,
    pub args: Vec<String>,
}

impl Target for Task {
    fn host(&self) -> &str {
        &self.host
    }
}

/// The hash constructions the benchmark knows about.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Method {
    #[serde(rename = "seq")]
    Sequential,
    #[serde(rename = "par")]
    Parallel,
    #[serde(rename = "par2")]
    Parallel2,
}

impl Method {
    /// All methods, in plotting order.
    pub const ALL: [Method; 3] = [Method::Sequential, Method::Parallel, Method::Parallel2];

    /// The value of the benchmark's `-name` flag, which also appears in result file names.
    pub fn tag(self) -> &'static str {
        match self {
            Method::Sequential => "seq",
            Method::Parallel => "par",
            Method::Parallel2 => "par2",
        }
    }

    /// The name used in plot titles.
    pub fn display_name(self) -> &'static str {
        match self {
            Method::Sequential => "Sequential",
            Method::Parallel => "Parallel",
            Method::Parallel2 => "Parallel2",
        }
    }

    /// Position in plotting order.
    pub fn rank(self) -> usize {
        self as usize
    }

    pub fn from_tag(tag: &str) -> Option<Method> {
        Method::ALL.iter().copied().find(|m| m.tag() == tag)
    }
}

/// The arguments of one invocation of the standalone benchmark.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub method: Method,
    pub gamma: f64,
    /// How many times the benchmark repeats each measurement.
    pub count: usize,
    /// Only meaningful for `par2`.
    pub partitions: Option<usize>,
    /// Run with a single key count instead of the benchmark's built-in range.
    pub keys: Option<usize>,
}

impl SweepPoint {
    pub fn args(&self) -> Vec<String> {
        let mut args = vec![
            "-name".to_owned(),
            self.method.tag().to_owned(),
            "-gamma".to_owned(),
            format!("{:?}", self.gamma),
            "-count".to_owned(),
            self.count.to_string(),
        ];
        if let Some(partitions) = self.partitions {
            args.push("-partitions".into());
            args.push(partitions.to_string());
        }
        if let Some(keys) = self.keys {
            args.push("-keys".into());
            args.push(keys.to_string());
        }
        args
    }
}

/// Sweep over the standalone benchmark: one point each for `seq` and `par`, then one `par2` point
/// per partition count. Every point gets its own block of `block` hosts, and every host of the
/// block runs the point once.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PartitionSweep {
    pub gamma: f64,
    pub count: usize,
    pub block: usize,
    pub partitions: Vec<usize>,
    #[serde(default)]
    pub keys: Option<usize>,
}

impl Default for PartitionSweep {
    fn default() -> Self {
        PartitionSweep {
            gamma: 2.0,
            count: 10,
            block: 2,
            partitions: vec![2, 4, 8, 16, 32, 64, 128, 256, 512, 1024, 2048, 4096],
            keys: None,
        }
    }
}

impl PartitionSweep {
    pub fn points(&self) -> Vec<SweepPoint> {
        let point = |method, partitions| SweepPoint {
            method,
            gamma: self.gamma,
            count: self.count,
            partitions,
            keys: self.keys,
        };

        let mut points = vec![
            point(Method::Sequential, None),
            point(Method::Parallel, None),
        ];
        points.extend(
            self.partitions
                .iter()
                .map(|&p| point(Method::Parallel2, Some(p))),
        );
        points
    }

    /// Assign blocks of the pool to points, left to right, never reusing a host.
    pub fn tasks(&self, pool: &HostPool) -> Result<Vec<Task>, failure::Error> {
        if self.block == 0 {
            return Err(RunnerError::Config("the block size must be at least 1".into()).into());
        }

        let points = self.points();
        pool.require(points.len() * self.block)?;

        Ok(points
            .iter()
            .zip(pool.hosts().chunks(self.block))
            .flat_map(|(point, block)| {
                let args = point.args();
                block.iter().map(move |host| Task {
                    host: host.clone(),
                    args: args.clone(),
                })
            })
            .collect())
    }
}

/// Sweep over the `go test` benchmark binary: the first `split` hosts benchmark construction, the
/// rest benchmark lookups.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GoTestSweep {
    pub split: usize,
    pub common: Vec<String>,
    pub first_bench: String,
    pub second_bench: String,
}

impl Default for GoTestSweep {
    fn default() -> Self {
        GoTestSweep {
            split: 15,
            common: vec![
                "-test.run=none".into(),
                "-test.count=1".into(),
                "-test.timeout=0".into(),
            ],
            first_bench: "BenchmarkNewBBHash".into(),
            second_bench: "BenchmarkFind".into(),
        }
    }
}

impl GoTestSweep {
    /// One task per host of the pool. A pool smaller than `split` runs only the first benchmark.
    pub fn tasks(&self, pool: &HostPool) -> Result<Vec<Task>, failure::Error> {
        pool.require(1)?;

        Ok(pool
            .hosts()
            .iter()
            .enumerate()
            .map(|(i, host)| {
                let bench = if i < self.split {
                    &self.first_bench
                } else {
                    &self.second_bench
                };
                let mut args = self.common.clone();
                args.push(format!("-test.bench={}", bench));
                Task {
                    host: host.clone(),
                    args,
                }
            })
            .collect())
    }
}

/// A complete sweep definition, as stored in a sweep file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Sweep {
    Partitions(PartitionSweep),
    GoTest(GoTestSweep),
}

impl Sweep {
    pub fn tasks(&self, pool: &HostPool) -> Result<Vec<Task>, failure::Error> {
        match self {
            Sweep::Partitions(sweep) => sweep.tasks(pool),
            Sweep::GoTest(sweep) => sweep.tasks(pool),
        }
    }

    /// Read a sweep definition from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, failure::Error> {
        use failure::ResultExt;

        let contents = std::fs::read_to_string(path)
            .with_context(|_| format!("reading sweep file {}", path.display()))?;
        let sweep = serde_json::from_str(&contents)
            .with_context(|_| format!("parsing sweep file {}", path.display()))?;
        Ok(sweep)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn default_pool() -> HostPool {
        HostPool::numbered("bbchain", 2..30)
    }

    #[test]
    fn numbered_pool_is_half_open() {
        let pool = default_pool();
        assert_eq!(pool.len(), 28);
        assert_eq!(pool.hosts()[0], "bbchain2");
        assert_eq!(pool.hosts()[27], "bbchain29");
    }

    #[test]
    fn task_count_matches_sweep_shape() {
        let sweep = PartitionSweep::default();
        let tasks = sweep.tasks(&default_pool()).unwrap();
        assert_eq!(tasks.len(), 2 + 2 + 2 * sweep.partitions.len());

        let sweep = PartitionSweep {
            partitions: vec![4, 8],
            ..Default::default()
        };
        let tasks = sweep.tasks(&default_pool()).unwrap();
        assert_eq!(tasks.len(), 2 + 2 + 2 * 2);
    }

    #[test]
    fn no_host_is_shared_between_points() {
        let sweep = PartitionSweep::default();
        let tasks = sweep.tasks(&default_pool()).unwrap();

        let hosts: BTreeSet<_> = tasks.iter().map(|t| t.host.clone()).collect();
        assert_eq!(hosts.len(), tasks.len());
    }

    #[test]
    fn blocks_are_assigned_left_to_right() {
        let sweep = PartitionSweep {
            gamma: 2.0,
            count: 3,
            block: 2,
            partitions: vec![4],
            keys: None,
        };
        let tasks = sweep.tasks(&default_pool()).unwrap();

        let expect = |host: &str, args: &[&str]| Task {
            host: host.into(),
            args: args.iter().map(|s| s.to_string()).collect(),
        };
        let seq = ["-name", "seq", "-gamma", "2.0", "-count", "3"];
        let par = ["-name", "par", "-gamma", "2.0", "-count", "3"];
        let par2 = [
            "-name",
            "par2",
            "-gamma",
            "2.0",
            "-count",
            "3",
            "-partitions",
            "4",
        ];

        assert_eq!(
            tasks,
            vec![
                expect("bbchain2", &seq),
                expect("bbchain3", &seq),
                expect("bbchain4", &par),
                expect("bbchain5", &par),
                expect("bbchain6", &par2),
                expect("bbchain7", &par2),
            ]
        );
    }

    #[test]
    fn small_pool_is_a_bounds_error() {
        let pool = HostPool::numbered("bbchain", 2..8);
        let err = PartitionSweep::default().tasks(&pool).unwrap_err();

        match err.downcast_ref::<RunnerError>() {
            Some(RunnerError::HostPoolExhausted { needed, available }) => {
                assert_eq!(*needed, 28);
                assert_eq!(*available, 6);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn zero_block_is_rejected() {
        let sweep = PartitionSweep {
            block: 0,
            ..Default::default()
        };
        assert!(sweep.tasks(&default_pool()).is_err());
    }

    #[test]
    fn keys_flag_is_passed_through() {
        let point = SweepPoint {
            method: Method::Parallel2,
            gamma: 1.5,
            count: 1,
            partitions: Some(8),
            keys: Some(1000),
        };
        assert_eq!(
            point.args().join(" "),
            "-name par2 -gamma 1.5 -count 1 -partitions 8 -keys 1000"
        );
    }

    #[test]
    fn gotest_splits_the_pool() {
        let tasks = GoTestSweep::default().tasks(&default_pool()).unwrap();
        assert_eq!(tasks.len(), 28);
        assert_eq!(
            tasks[0].args,
            vec![
                "-test.run=none",
                "-test.count=1",
                "-test.timeout=0",
                "-test.bench=BenchmarkNewBBHash"
            ]
        );
        assert!(tasks[..15]
            .iter()
            .all(|t| t.args[3] == "-test.bench=BenchmarkNewBBHash"));
        assert!(tasks[15..]
            .iter()
            .all(|t| t.args[3] == "-test.bench=BenchmarkFind"));
    }

    #[test]
    fn method_tags_round_trip() {
        for m in Method::ALL.iter() {
            assert_eq!(Method::from_tag(m.tag()), Some(*m));
        }
        assert_eq!(Method::from_tag("par3"), None);
        assert!(Method::Sequential.rank() < Method::Parallel.rank());
        assert!(Method::Parallel.rank() < Method::Parallel2.rank());
    }

    #[test]
    fn sweep_file_is_tagged_json() {
        let json = r#"{
            "kind": "partitions",
            "gamma": 2.0,
            "count": 5,
            "block": 1,
            "partitions": [2, 4]
        }"#;
        let sweep: Sweep = serde_json::from_str(json).unwrap();
        let tasks = sweep.tasks(&default_pool()).unwrap();
        assert_eq!(tasks.len(), 4);
        assert_eq!(tasks[3].host, "bbchain5");
        assert_eq!(tasks[3].args.last().unwrap(), "4");
    }
}
