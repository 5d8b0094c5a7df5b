/// One way to retrieve the decoder toolchain: where both artifacts live and
/// which retrieval strategy to use. Declared statically, read-only at
/// runtime.
#[derive(Debug, Clone)]
pub struct EngineSource {
    /// Identifies the source in load-attempt logs.
    pub name: String,

    /// URL of the decoder executable.
    pub decoder_url: String,

    /// URL of the companion prober executable.
    pub prober_url: String,

    /// Stream the download straight to disk instead of buffering the whole
    /// body in memory first. Streaming holds up better against large
    /// binaries and flaky CDN responses; buffering is the simpler path.
    pub stream_to_disk: bool,
}

impl EngineSource {
    pub fn new(
        name: &str,
        decoder_url: &str,
        prober_url: &str,
        stream_to_disk: bool,
    ) -> Self {
        Self {
            name: name.to_string(),
            decoder_url: decoder_url.to_string(),
            prober_url: prober_url.to_string(),
            stream_to_disk,
        }
    }
}

/// The default source list, tried in order. Spans two CDN origins and two
/// artifact versions so a single outage or a broken release cannot take the
/// engine down.
pub fn default_sources() -> Vec<EngineSource> {
    vec![
        EngineSource::new(
            "unpkg 4.1.0 (streamed)",
            "https://unpkg.com/@ffmpeg-installer/linux-x64@4.1.0/ffmpeg",
            "https://unpkg.com/@ffprobe-installer/linux-x64@4.1.0/ffprobe",
            true,
        ),
        EngineSource::new(
            "unpkg 4.1.0 (buffered)",
            "https://unpkg.com/@ffmpeg-installer/linux-x64@4.1.0/ffmpeg",
            "https://unpkg.com/@ffprobe-installer/linux-x64@4.1.0/ffprobe",
            false,
        ),
        EngineSource::new(
            "jsdelivr 4.1.0",
            "https://cdn.jsdelivr.net/npm/@ffmpeg-installer/linux-x64@4.1.0/ffmpeg",
            "https://cdn.jsdelivr.net/npm/@ffprobe-installer/linux-x64@4.1.0/ffprobe",
            true,
        ),
        EngineSource::new(
            "unpkg 4.0.0",
            "https://unpkg.com/@ffmpeg-installer/linux-x64@4.0.0/ffmpeg",
            "https://unpkg.com/@ffprobe-installer/linux-x64@4.0.0/ffprobe",
            true,
        ),
        EngineSource::new(
            "github b6.0",
            "https://github.com/eugeneware/ffmpeg-static/releases/download/b6.0/ffmpeg-linux-x64",
            "https://github.com/eugeneware/ffmpeg-static/releases/download/b6.0/ffprobe-linux-x64",
            true,
        ),
    ]
}
