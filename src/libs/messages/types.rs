#[derive(Debug, Clone)]
pub enum Message {
    // === CONFIGURATION MESSAGES ===
    ConfigSaved,
    ConfigModuleServer,
    ConfigModulePoll,
    ConfigModuleShift,
    ServerNotConfigured,

    // === PROMPTS ===
    PromptSelectModules,
    PromptServerApiUrl,
    PromptServerEndpoint,
    PromptServerAuthToken,
    PromptForegroundInterval,
    PromptBackgroundInterval,
    PromptFetchTimeout,
    PromptHighlightMs,
    PromptLegacyMillis,
    PromptShiftStart,
    PromptShiftDuration,
    PromptBreakStart,
    PromptBreakEnd,
    PromptOpenCutoff,

    // === INPUT VALIDATION ===
    InvalidTimeFormat(String),
    InvalidDateFormat(String),

    // === WATCH MESSAGES ===
    WatchStarted(String), // url
    WatchHint,
    WatchStopped,
    WatchReceivedCtrlC,
    WatchReceivedSigterm,
    SignalHandlerFailed(String),
    VisibilityChanged(String),
    PollingResumed(u64), // interval seconds
    PollingPaused,
    PollFailed(String),
    ShowingStaleData,
    GroupsUpdated(usize),

    // === REPORT MESSAGES ===
    GroupsHeader(String, String), // dimension, date
    SummaryHeader(String),        // date
    NoGroups,
    FetchFailed(String),

    // === EXPORT MESSAGES ===
    ExportCompleted(String),
    ExportNoData,
}
