use std::fmt::Display;

/// Routes served by the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Health check.
    Hello,
    /// Fire-and-forget job launch.
    Schedule,
    /// Launch and wait for the job to finish.
    Run,
}

impl Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let fragment = match self {
            Route::Hello => "/",
            Route::Schedule => "/schedule/:namespace/:name",
            Route::Run => "/run/:namespace/:name",
        };

        write!(f, "{fragment}")
    }
}
