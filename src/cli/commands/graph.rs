//! Graph command - print the resource dependency graph

use super::CommandContext;
use anyhow::Result;
use clap::Parser;

/// Arguments for the graph command
#[derive(Parser, Debug, Clone)]
pub struct GraphArgs {
    /// Print the topological order instead of DOT
    #[arg(long)]
    pub order: bool,
}

impl GraphArgs {
    /// Execute the graph command
    pub async fn execute(&self, ctx: &mut CommandContext) -> Result<i32> {
        let site = ctx.assemble_site().await?;
        let graph = site.graph();

        if ctx.output.is_json() {
            let edges: Vec<serde_json::Value> = graph
                .edges()
                .into_iter()
                .map(|(from, to, kind)| serde_json::json!({ "from": from, "to": to, "kind": kind }))
                .collect();
            ctx.output.json(&serde_json::json!({
                "nodes": graph.nodes().collect::<Vec<_>>(),
                "edges": edges,
                "order": graph.topological_order()?,
            }));
            return Ok(0);
        }

        if self.order {
            for (i, id) in graph.topological_order()?.iter().enumerate() {
                let scope = graph.node(id).map(|n| n.scope.as_str()).unwrap_or("?");
                println!("{:>2}. {} [{}]", i + 1, id, scope);
            }
        } else {
            print!("{}", graph.to_dot());
        }

        Ok(0)
    }
}
