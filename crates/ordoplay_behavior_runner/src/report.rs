// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-of-run report.

use crate::scenario::{RunnerError, Simulation};
use clap::ValueEnum;
use indexmap::IndexMap;
use ordoplay_behavior_graph::{PlayState, PropertyValue, TickStats};
use serde::{Deserialize, Serialize};

/// Report encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ReportFormat {
    /// Pretty RON
    #[default]
    Ron,
    /// Pretty JSON
    Json,
}

/// Final state of one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityReport {
    /// Entity name
    pub name: String,
    /// Final position
    pub position: [f32; 3],
    /// Force applied over the run, if the entity has a rigidbody
    pub force: Option<[f32; 3]>,
}

/// Final state of one behavior graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphReport {
    /// Owning entity name
    pub entity: String,
    /// Node count
    pub nodes: usize,
    /// Connection count
    pub connections: usize,
    /// Variables in insertion order
    pub variables: IndexMap<String, PropertyValue>,
}

/// What a run produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Ticks run
    pub ticks: u32,
    /// Scaled seconds simulated
    pub elapsed: f64,
    /// Interpreter state at the end
    pub state: PlayState,
    /// Stats summed over every tick
    pub stats: TickStats,
    /// Entities in spawn order
    pub entities: Vec<EntityReport>,
    /// Graphs in attachment order
    pub graphs: Vec<GraphReport>,
}

impl Report {
    /// Capture a simulation
    pub fn capture(sim: &Simulation, stats: TickStats) -> Self {
        let entities = sim
            .scene
            .entities
            .values()
            .map(|entity| EntityReport {
                name: entity.name.clone(),
                position: entity.transform.position,
                force: entity.rigidbody.map(|body| body.accumulated_force),
            })
            .collect();

        let graphs = sim
            .interpreter
            .store()
            .graphs()
            .map(|graph| GraphReport {
                entity: sim
                    .name_of(graph.entity())
                    .map_or_else(|| graph.entity().to_string(), str::to_string),
                nodes: graph.node_count(),
                connections: graph.connection_count(),
                variables: graph
                    .variables()
                    .iter()
                    .map(|(name, value)| (name.to_string(), value.clone()))
                    .collect(),
            })
            .collect();

        Self {
            ticks: sim.tick(),
            elapsed: sim.interpreter.elapsed(),
            state: sim.interpreter.state(),
            stats,
            entities,
            graphs,
        }
    }

    /// Encode in the requested format
    pub fn render(&self, format: ReportFormat) -> Result<String, RunnerError> {
        match format {
            ReportFormat::Ron => {
                let config = ron::ser::PrettyConfig::default()
                    .struct_names(true)
                    .enumerate_arrays(false);
                Ok(ron::ser::to_string_pretty(self, config)?)
            }
            ReportFormat::Json => Ok(serde_json::to_string_pretty(self)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::Scenario;

    #[test]
    fn test_report_after_sample_run() {
        let mut sim = Scenario::sample().build().unwrap();
        let stats = sim.run(40);
        let report = Report::capture(&sim, stats);

        assert_eq!(report.ticks, 40);
        assert_eq!(report.state, PlayState::Playing);
        assert_eq!(report.entities.len(), 2);
        assert_eq!(report.entities[0].name, "Player");
        assert_eq!(report.entities[0].force, Some([80.0, 0.0, 0.0]));
        assert_eq!(report.entities[1].force, None);
        assert_eq!(report.graphs[0].entity, "Player");
        assert!(report.graphs[0].variables.contains_key("last_hit_position"));
    }

    #[test]
    fn test_render_formats() {
        let mut sim = Scenario::sample().build().unwrap();
        let stats = sim.run(2);
        let report = Report::capture(&sim, stats);

        let json = report.render(ReportFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["ticks"], 2);
        assert_eq!(value["graphs"][0]["entity"], "Player");

        let ron_text = report.render(ReportFormat::Ron).unwrap();
        let decoded: Report = ron::from_str(&ron_text).unwrap();
        assert_eq!(decoded.ticks, 2);
        assert_eq!(decoded.stats, report.stats);
    }
}
