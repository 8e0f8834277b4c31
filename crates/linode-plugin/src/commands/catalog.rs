use crate::GlobalArgs;
use crate::utils;
use colored::Colorize;
use linode_plugin_cloud::LinodeProvider;
use linode_plugin_config::PluginSettings;

pub async fn images(global: &GlobalArgs) -> anyhow::Result<()> {
    let settings = PluginSettings::load()?;
    let client = utils::connect(global, &settings)?;

    let images = client.list_images().await?;
    println!("{}", "Images:".bold());
    for image in images.iter().filter(|i| !i.deprecated) {
        println!("  {} {}", image.id.cyan(), image.label.dimmed());
    }

    Ok(())
}

pub async fn regions(global: &GlobalArgs) -> anyhow::Result<()> {
    let settings = PluginSettings::load()?;
    let client = utils::connect(global, &settings)?;

    let regions = client.list_regions().await?;
    println!("{}", "Regions:".bold());
    for region in regions.iter().filter(|r| r.accepts_linodes()) {
        println!(
            "  {} {} ({})",
            region.id.cyan(),
            region.label,
            region.country.to_uppercase().dimmed()
        );
    }

    Ok(())
}

pub async fn types(global: &GlobalArgs, region: Option<&str>) -> anyhow::Result<()> {
    let settings = PluginSettings::load()?;
    let client = utils::connect(global, &settings)?;

    let types = client.fetch_instance_types(region.unwrap_or_default()).await?;
    println!("{}", "Instance types:".bold());
    for instance_type in types {
        println!("  {}", instance_type.cyan());
    }

    Ok(())
}
