use std::collections::VecDeque;

use infection_core::{PlotPalette, Result, SiteVersion, UserId};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::UserGraph;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotNode {
    pub id: UserId,
    pub label: String,
    pub color: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotEdge {
    pub from: UserId,
    pub to: UserId,
}

/// Node and edge records for a network view, in the shape vis.js expects.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotData {
    pub nodes: Vec<PlotNode>,
    pub edges: Vec<PlotEdge>,
}

/// Collect the plot payload for everything reachable from `start`.
///
/// Walks the same frontier as propagation but never writes. Each user is
/// emitted once, labelled by the role it was first seen in; every coach to
/// student edge is emitted, including those of coaches first seen as a
/// student. Users carrying `tag` get `palette.infected`.
pub fn plot_data(
    graph: &UserGraph,
    start: UserId,
    tag: SiteVersion,
    palette: &PlotPalette,
) -> Result<PlotData> {
    graph.user(start)?;

    let mut queue = VecDeque::from([start]);
    let mut visited: FxHashSet<UserId> = FxHashSet::default();
    let mut emitted: FxHashSet<UserId> = FxHashSet::default();
    let mut data = PlotData::default();

    let color = |id: UserId| -> Result<String> {
        Ok(if graph.site_version(id)? == tag {
            palette.infected.clone()
        } else {
            palette.uninfected.clone()
        })
    };

    while let Some(current) = queue.pop_front() {
        if visited.contains(&current) {
            continue;
        }

        let user = graph.user(current)?;
        if user.is_coach() {
            if emitted.insert(current) {
                data.nodes.push(PlotNode {
                    id: current,
                    label: format!("Coach {}", current),
                    color: color(current)?,
                });
            }

            for &student in user.students() {
                if emitted.insert(student) {
                    data.nodes.push(PlotNode {
                        id: student,
                        label: format!("Student {}", student),
                        color: color(student)?,
                    });
                }
                data.edges.push(PlotEdge {
                    from: current,
                    to: student,
                });
            }
        }

        visited.insert(current);
        queue.extend(graph.connected_coaches(current)?);
    }

    Ok(data)
}
