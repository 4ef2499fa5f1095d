use crate::engine::EngineContext;
use crate::error::LookbookError;
use crate::ops::{Operation, Outcome, execute_with_retry};
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort};
use tracing::{debug, info};

#[derive(Debug)]
pub enum DbActorMessage {
    /// Run one operation in its own transaction, retrying lost write races.
    Execute(Operation, RpcReplyPort<Result<Outcome, LookbookError>>),
}

#[derive(Clone)]
pub struct DbActorHandle {
    actor: ActorRef<DbActorMessage>,
}

impl DbActorHandle {
    pub async fn execute(&self, op: Operation) -> Result<Outcome, LookbookError> {
        ractor::call!(self.actor, DbActorMessage::Execute, op)
            .map_err(|e| LookbookError::RactorError(format!("DbActor Execute RPC failed: {e}")))?
    }

    pub fn stop(&self) {
        self.actor.stop(None);
    }
}

struct DbActor;

#[ractor::async_trait]
impl Actor for DbActor {
    type Msg = DbActorMessage;
    type State = EngineContext;
    type Arguments = EngineContext;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        ctx: Self::Arguments,
    ) -> Result<Self::State, ActorProcessingErr> {
        info!(
            exclusive_voting = ctx.config.exclusive_voting,
            conflict_retry_max_times = ctx.config.conflict_retry_max_times,
            "DbActor initialized"
        );
        Ok(ctx)
    }

    async fn handle(
        &self,
        _myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> Result<(), ActorProcessingErr> {
        match message {
            DbActorMessage::Execute(op, reply) => {
                let name = op.name();
                let res = execute_with_retry(state, op).await;
                debug!(operation = name, ok = res.is_ok(), "operation finished");
                let _ = reply.send(res);
            }
        }
        Ok(())
    }
}

/// Spawn the database actor and return a cloneable handle.
pub async fn spawn(ctx: EngineContext) -> Result<DbActorHandle, LookbookError> {
    let (actor, _jh) = Actor::spawn(None, DbActor, ctx)
        .await
        .map_err(|e| LookbookError::RactorError(format!("failed to spawn DbActor: {e}")))?;

    Ok(DbActorHandle { actor })
}
