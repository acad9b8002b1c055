/// Log level a [`show_message!`] call is sent at.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogType {
    Info,
    Debug,
    Error,
    Trace,
}

/// Sends `$msg` to the `log` facade at the level picked by `$logtype`.
///
/// ```ignore
/// show_message!("area block done", LogType::Info);
/// ```
#[macro_export]
macro_rules! show_message {
    ($msg: expr, $logtype: expr) => {
        match $logtype {
            $crate::macros::LogType::Info => log::info!("{}", $msg),
            $crate::macros::LogType::Debug => log::debug!("{}", $msg),
            $crate::macros::LogType::Error => log::error!("{}", $msg),
            $crate::macros::LogType::Trace => log::trace!("{}", $msg),
        }
    };
}

/// Runs `$fn` and logs how long it took under the name `$msg`. Without a
/// `$logtype` the timing goes out at debug level.
///
/// ```ignore
/// let metrics = measure_time!("object block", || matcher.run(&gt, &pred), LogType::Debug);
/// ```
#[macro_export]
macro_rules! measure_time {
    ($msg: expr, $fn: expr) => {{
        let instant = std::time::Instant::now();
        let res = $fn();
        log::debug!(
            "Finished \"{}\" in {} ms",
            $msg,
            instant.elapsed().as_millis(),
        );
        res
    }};
    ($msg: expr, $fn: expr, $logtype: expr) => {{
        let instant = std::time::Instant::now();
        let res = $fn();
        $crate::show_message!(
            format!(
                "Finished \"{}\" in {} ms",
                $msg,
                instant.elapsed().as_millis(),
            ),
            $logtype
        );
        res
    }};
}
