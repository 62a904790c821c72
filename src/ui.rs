// Terminal output of the validate command

use std::path::Path;

use colored::Colorize;

use crate::domain::{ArtifactDescriptor, LoginDescriptor};

/// Title line naming the checked configuration file
pub fn print_config_title(config: &Path) {
    println!();
    println!("{} {}", "Release configuration".bright_blue().bold(), config.display());
    println!("{}", "─".repeat(60).bright_blue());
}

pub fn print_login(login: &LoginDescriptor) {
    println!("{} {}", "login:".bright_cyan(), login_line(login));
}

/// Login strategy without credential material
fn login_line(login: &LoginDescriptor) -> String {
    match login {
        LoginDescriptor::Gateway(gateway) => format!(
            "gateway {} project {} ({:?})",
            gateway.gateway_url, gateway.project, gateway.orchestrator
        ),
        LoginDescriptor::Themisto(themisto) => format!("themisto {} (deprecated)", themisto.instance_url),
    }
}

pub fn print_artifact(descriptor: &ArtifactDescriptor) {
    let base = descriptor.base();
    println!(
        "  {} {} {}",
        "•".bright_blue(),
        base.resource_name.bold(),
        format!("[{}]", descriptor.kind()).dimmed()
    );
    if !base.app_name.is_empty() {
        println!("      app: {}", base.app_name);
    }
    for app in &base.apps {
        println!("      app: {}", app.name);
    }
    if descriptor.needs_file_bundling() {
        println!("      files: {}", base.file_patterns.join(", "));
    }
    println!("      watch policy: {}", base.stage_watch_policy.name());
}

/// Closing line with the number of artifacts ready for upload
pub fn print_ready(artifacts: usize) {
    println!();
    println!(
        "{}",
        format!("✅ {} artifact(s) ready for release", artifacts).bright_green().bold()
    );
}
