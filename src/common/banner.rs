const GREEN: &str = "\x1b[32m";
const CYAN: &str = "\x1b[36m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";

/// What the startup banner shows besides the logo.
pub struct BannerInfo {
    pub version: &'static str,
    pub profile: &'static str,
    pub listen: String,
    pub pages: String,
    pub auth: bool,
}

impl BannerInfo {
    pub fn new(listen: String, pages: String, auth: bool) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            profile: if cfg!(debug_assertions) {
                "debug"
            } else {
                "release"
            },
            listen,
            pages,
            auth,
        }
    }
}

const LOGO: [&str; 6] = [
    r"          __            __           ",
    r"   __  __/ /_________  / /___ ___  __",
    r"  / / / / __/ ___/ _ \/ / __ `/ / / /",
    r" / /_/ / /_/ /  /  __/ / /_/ / /_/ / ",
    r" \__, /\__/_/   \___/_/\__,_/\__, /  ",
    r"/____/                      /____/   ",
];

pub fn print_banner(info: &BannerInfo) {
    println!();
    for line in LOGO {
        println!("{GREEN}{line}{RESET}");
    }
    println!("{DIM}========================================{RESET}");
    println!();

    print_row("Version", info.version, CYAN);
    print_row("Profile", info.profile, YELLOW);
    print_row("Listening", &info.listen, RESET);
    print_row("Page order", &info.pages, RESET);
    print_row("Auth", if info.auth { "password" } else { "open" }, RESET);
    println!();
}

fn print_row(label: &str, value: &str, color: &str) {
    println!("  {BOLD}{label:<14}{RESET}{color}{value}{RESET}");
}
