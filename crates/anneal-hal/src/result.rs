//! Decoded anneal results.

use anneal_ir::ScheduleTable;
use serde::{Deserialize, Serialize};

use crate::embedding::Embedding;
use crate::job::JobId;

/// One distinct measured configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Measured bit per active variable, in active-variable order.
    pub bits: Vec<u8>,
    /// Ising energy of the configuration.
    pub energy: f64,
    /// How many reads produced this configuration.
    pub occurrences: u32,
}

impl Sample {
    /// Create a sample.
    pub fn new(bits: Vec<u8>, energy: f64, occurrences: u32) -> Self {
        Self {
            bits,
            energy,
            occurrences,
        }
    }

    /// Measurement as a `0`/`1` string.
    pub fn bitstring(&self) -> String {
        self.bits
            .iter()
            .map(|&b| if b == 0 { '0' } else { '1' })
            .collect()
    }
}

/// Measurement data of one anneal job.
///
/// Samples are kept in the order the solver reported them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnnealBuffer {
    /// Solver that produced the samples.
    pub solver: String,
    /// Hardware qubit indices the bits of each sample refer to.
    pub active_variables: Vec<u32>,
    /// Decoded samples.
    pub samples: Vec<Sample>,
    /// Embedding used for the job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Embedding>,
    /// Schedule generated from the kernel's anneal directive.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule: Option<ScheduleTable>,
    /// Remote job identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
}

impl AnnealBuffer {
    /// Create an empty buffer.
    pub fn new(solver: impl Into<String>, active_variables: Vec<u32>) -> Self {
        Self {
            solver: solver.into(),
            active_variables,
            ..Self::default()
        }
    }

    /// Attach the embedding.
    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Attach the anneal schedule.
    pub fn with_schedule(mut self, schedule: ScheduleTable) -> Self {
        self.schedule = Some(schedule);
        self
    }

    /// Attach the job identifier.
    pub fn with_job_id(mut self, job_id: JobId) -> Self {
        self.job_id = Some(job_id);
        self
    }

    /// Append a sample.
    pub fn add_sample(&mut self, sample: Sample) {
        self.samples.push(sample);
    }

    /// Number of distinct samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the buffer holds no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Sum of occurrences over all samples.
    pub fn total_reads(&self) -> u64 {
        self.samples.iter().map(|s| u64::from(s.occurrences)).sum()
    }

    /// Sample with the smallest energy (first one on ties).
    pub fn lowest_energy(&self) -> Option<&Sample> {
        self.samples
            .iter()
            .reduce(|best, s| if s.energy < best.energy { s } else { best })
    }

    /// Sample with the most occurrences (first one on ties).
    pub fn most_probable(&self) -> Option<&Sample> {
        self.samples
            .iter()
            .reduce(|best, s| if s.occurrences > best.occurrences { s } else { best })
    }

    /// Energies in sample order.
    pub fn energies(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.energy).collect()
    }
}
