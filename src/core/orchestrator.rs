//! 编排器：主控循环
//!
//! 路由 → 节点 → 归约 → 路由，直到路由返回 End。每轮只调用一个节点；
//! 节点返回 StateUpdate，由 ResearchState::apply 生成新状态。

use tokio::sync::mpsc;

use crate::agents::{execute_step, AgentRoster, LeadResearcher};
use crate::config::AppConfig;
use crate::core::{route, AgentError, OrchestratorEvent, ResearchState, Route, StateUpdate};
use crate::memory::Message;

pub struct Orchestrator {
    coordinator: LeadResearcher,
    roster: AgentRoster,
    max_planning_attempts: usize,
    max_iterations: usize,
}

impl Orchestrator {
    pub fn new(coordinator: LeadResearcher, roster: AgentRoster) -> Self {
        let defaults = AppConfig::default();
        Self {
            coordinator,
            roster,
            max_planning_attempts: defaults.app.max_planning_attempts,
            max_iterations: defaults.app.max_iterations,
        }
    }

    /// 从 [app] 配置段读取规划次数与迭代上限
    pub fn with_limits(mut self, cfg: &AppConfig) -> Self {
        self.max_planning_attempts = cfg.app.max_planning_attempts.max(1);
        self.max_iterations = cfg.app.max_iterations.max(1);
        self
    }

    pub async fn run(&self, state: ResearchState) -> Result<ResearchState, AgentError> {
        self.run_with_events(state, None).await
    }

    /// 运行直到结束；events 不为空时推送每次路由与节点完成事件
    pub async fn run_with_events(
        &self,
        initial: ResearchState,
        events: Option<&mpsc::UnboundedSender<OrchestratorEvent>>,
    ) -> Result<ResearchState, AgentError> {
        let emit = |event: OrchestratorEvent| {
            if let Some(tx) = events {
                let _ = tx.send(event);
            }
        };

        let mut state = initial;
        tracing::info!(run = %state.run_id, query = %state.user_query, "orchestration started");

        for iteration in 0..self.max_iterations {
            let next = route(&state, self.max_planning_attempts);
            tracing::debug!(run = %state.run_id, iteration, route = %next, "routed");
            emit(OrchestratorEvent::Routed { route: next });

            let update = match next {
                Route::End => {
                    if state.planning_failed(self.max_planning_attempts) {
                        tracing::warn!(
                            run = %state.run_id,
                            attempts = state.planning_attempts,
                            "giving up on planning"
                        );
                        state.messages.push(Message::assistant(format!(
                            "Unable to create a research plan after {} attempts.",
                            state.planning_attempts
                        )));
                    }
                    tracing::info!(
                        run = %state.run_id,
                        iterations = iteration,
                        completed = state.plan.completed_count(),
                        "orchestration finished"
                    );
                    emit(OrchestratorEvent::Finished {
                        final_answer: state.final_answer.clone(),
                    });
                    return Ok(state);
                }
                Route::Plan => self.coordinator.plan(&state).await?,
                Route::Execute { agent, index } => {
                    if state.current_step_index != index {
                        return Err(AgentError::CursorMismatch {
                            cursor: state.current_step_index,
                            selected: index,
                        });
                    }
                    execute_step(self.roster.get(agent), &state, index).await?
                }
                Route::Synthesize => self.coordinator.synthesize(&state).await?,
            };

            let node = next.node().unwrap_or("END");
            if update == StateUpdate::Unchanged {
                let step = match next {
                    Route::Execute { index, .. } => Some(index),
                    _ => None,
                };
                return Err(AgentError::Stalled {
                    node: node.to_string(),
                    step,
                });
            }

            state = state.apply(update)?;
            tracing::info!(
                run = %state.run_id,
                node,
                cursor = state.current_step_index,
                "node completed"
            );
            emit(OrchestratorEvent::NodeCompleted {
                node: node.to_string(),
                state: state.clone(),
            });
        }

        tracing::error!(run = %state.run_id, max = self.max_iterations, "iteration limit reached");
        Err(AgentError::IterationLimit(self.max_iterations))
    }
}
