use cucumber::given;
use reconciliation_engine::test_utils::fixtures::seed_project;

use crate::cucumber::{LedgerWorld, ReconciliationSystem};

#[given(expr = "a fresh install with project {word}")]
async fn fresh_database(world: &mut LedgerWorld, project_id: String) {
    let system = ReconciliationSystem::new().await;
    seed_project(system.api.db(), &project_id, &format!("code-{project_id}")).await;
    world.project_id = project_id;
    world.system = Some(system);
}
