pub fn setup() {
    // Colored backtraces. Only enabled *when* debugging.
    #[cfg(debug_assertions)]
    {
        color_backtrace::install();
    }
}
