use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use super::args::{require, AuthArgs, ProjectScopeArgs};
use super::{merge_active_profile, Command};
use crate::client::models::{
    HibernationSchedule, Machine, MachineImage, ShootClusterRequest, Volume, Worker,
    WorkerGroupRequest,
};
use crate::client::DEFAULT_KUBECONFIG_DURATION;
use crate::config::merge::{FlagSet, FlagSlot};
use crate::print_json;
use crate::utils::StyledStr;
use crate::{ApiSnafu, Error, GlobalOptions, JsonSnafu, WriteOutputSnafu};
use clap::{Parser, Subcommand};
use snafu::ResultExt;

#[derive(Subcommand, Debug)]
pub enum ShootCommand {
    /// List the shoot clusters of a project.
    List(Command<ListCommand>),
    /// Create a shoot cluster, or add a worker group to an existing one.
    Create(Command<CreateCommand>),
    /// Hibernate a shoot cluster.
    Hibernate(Command<HibernateCommand>),
    /// Wake up a hibernated shoot cluster.
    Wakeup(Command<WakeupCommand>),
    /// Delete a shoot cluster, or only one of its worker groups.
    Delete(Command<DeleteCommand>),
    /// Get an admin kubeconfig for a shoot cluster.
    ///
    /// NB: overwrites an existing file at --output-path.
    GenerateKubeconfig(Command<GenerateKubeconfigCommand>),
    /// Get the monitoring credentials of a shoot cluster.
    ///
    /// NB: overwrites an existing file at --output-path.
    GetMonitoringCreds(Command<GetMonitoringCredsCommand>),
}

impl ShootCommand {
    pub async fn run(self, global_options: GlobalOptions) -> Result<(), Error> {
        match self {
            Self::List(cmd) => cmd.run(global_options).await,
            Self::Create(cmd) => cmd.run(global_options).await,
            Self::Hibernate(cmd) => cmd.run(global_options).await,
            Self::Wakeup(cmd) => cmd.run(global_options).await,
            Self::Delete(cmd) => cmd.run(global_options).await,
            Self::GenerateKubeconfig(cmd) => cmd.run(global_options).await,
            Self::GetMonitoringCreds(cmd) => cmd.run(global_options).await,
        }
    }
}

// Flags shared by every shoot command.
#[derive(clap::Args, Debug)]
pub struct ShootArgs {
    #[command(flatten)]
    auth: AuthArgs,

    #[command(flatten)]
    project: ProjectScopeArgs,
}

impl FlagSet for ShootArgs {
    fn flag_slots(&mut self) -> Vec<FlagSlot<'_>> {
        let mut slots = self.auth.flag_slots();
        slots.extend(self.project.flag_slots());
        slots
    }
}

#[derive(Parser, Debug)]
pub struct ListCommand {
    #[command(flatten)]
    shoot: ShootArgs,
}

impl Command<ListCommand> {
    async fn run(mut self, global_options: GlobalOptions) -> Result<(), Error> {
        let shoot = &mut self.inner.shoot;
        merge_active_profile(shoot, &global_options);

        let client = shoot.auth.client()?;
        let clusters = client
            .list_shoot_clusters(shoot.project.scope()?)
            .await
            .context(ApiSnafu)?;

        print_json!(&clusters);

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct CreateCommand {
    #[command(flatten)]
    shoot: ShootArgs,

    /// Shoot cluster name.
    #[arg(short = 'n', long)]
    cluster_name: String,

    /// Create a new cluster. One of --cluster or --workergroup is required.
    #[arg(long, conflicts_with = "workergroup")]
    cluster: bool,

    /// Add a worker group to the cluster. One of --cluster or --workergroup is required.
    #[arg(long)]
    workergroup: bool,

    /// Worker group name, at most 6 characters. Required with --workergroup.
    #[arg(long, help_heading = "Worker group")]
    wg_name: Option<String>,

    /// Kubernetes version of a new cluster.
    #[arg(long, default_value = DEFAULT_KUBERNETES_VERSION)]
    k8s_version: String,

    /// Autoscaler minimum number of nodes.
    #[arg(long, default_value_t = 2, help_heading = "Worker group")]
    wg_min: u16,

    /// Autoscaler maximum number of nodes.
    #[arg(long, default_value_t = 3, help_heading = "Worker group")]
    wg_max: u16,

    /// Machine type of the nodes.
    #[arg(long, default_value = "b.2c4gb", help_heading = "Worker group")]
    wg_type: String,

    /// Image the nodes boot.
    #[arg(long, default_value = "gardenlinux", help_heading = "Worker group")]
    wg_image_name: String,

    /// Version of the node image.
    #[arg(long, default_value = "1312.2.0", help_heading = "Worker group")]
    wg_image_version: String,

    /// Volume size of each node.
    #[arg(long, default_value = "50Gi", help_heading = "Worker group")]
    wg_volume_size: String,

    /// Hibernation schedule start in cron format, e.g. "00 18 * * 1,2,3,4,5".
    #[arg(long, requires = "hibernation_end", help_heading = "Hibernation")]
    hibernation_start: Option<String>,

    /// Hibernation schedule end in cron format, e.g. "00 08 * * 1,2,3,4,5".
    #[arg(long, requires = "hibernation_start", help_heading = "Hibernation")]
    hibernation_end: Option<String>,
}

#[derive(Debug)]
enum CreateTarget {
    Cluster(ShootClusterRequest),
    WorkerGroup(WorkerGroupRequest),
}

const DEFAULT_KUBERNETES_VERSION: &str = "1.28.7";
const MAX_WORKER_GROUP_NAME_LEN: usize = 6;

impl CreateCommand {
    fn worker(&self) -> Result<Worker, Error> {
        let name = self.wg_name.clone().unwrap_or_default();
        if name.chars().count() > MAX_WORKER_GROUP_NAME_LEN {
            return Err(Error::InvalidFlag {
                flag: "wg-name",
                reason: format!("must be no longer than {MAX_WORKER_GROUP_NAME_LEN} characters"),
            });
        }
        if self.wg_min > self.wg_max {
            return Err(Error::InvalidFlag {
                flag: "wg-min",
                reason: format!("{} is above --wg-max {}", self.wg_min, self.wg_max),
            });
        }

        Ok(Worker {
            name,
            minimum: self.wg_min,
            maximum: self.wg_max,
            machine: Machine {
                kind: self.wg_type.clone(),
                image: MachineImage {
                    name: self.wg_image_name.clone(),
                    version: self.wg_image_version.clone(),
                },
            },
            volume: Volume {
                size: self.wg_volume_size.clone(),
            },
        })
    }

    fn cluster_request(&self) -> Result<ShootClusterRequest, Error> {
        let hibernation = match (&self.hibernation_start, &self.hibernation_end) {
            (Some(start), Some(end)) if !start.is_empty() && !end.is_empty() => {
                Some(HibernationSchedule {
                    start: start.clone(),
                    end: end.clone(),
                })
            }
            _ => None,
        };

        Ok(ShootClusterRequest::new(
            &self.cluster_name,
            &self.k8s_version,
            self.worker()?,
            hibernation,
        ))
    }

    fn target(&self) -> Result<CreateTarget, Error> {
        if self.cluster {
            Ok(CreateTarget::Cluster(self.cluster_request()?))
        } else if self.workergroup {
            Ok(CreateTarget::WorkerGroup(self.worker_group_request()?))
        } else {
            Err(Error::NoCreateTarget {})
        }
    }

    fn worker_group_request(&self) -> Result<WorkerGroupRequest, Error> {
        require(&self.wg_name, "wg-name")?;

        Ok(WorkerGroupRequest {
            worker: self.worker()?,
        })
    }
}

impl Command<CreateCommand> {
    async fn run(mut self, global_options: GlobalOptions) -> Result<(), Error> {
        let target = self.inner.target()?;

        let shoot = &mut self.inner.shoot;
        merge_active_profile(shoot, &global_options);

        let client = shoot.auth.client()?;
        let scope = shoot.project.scope()?;
        let cluster_name = &self.inner.cluster_name;

        match target {
            CreateTarget::Cluster(request) => {
                let cluster = client
                    .create_shoot_cluster(scope, &request)
                    .await
                    .context(ApiSnafu)?;

                StyledStr::success(format!(
                    "cluster `{}` is being created, check its status with `cleura shoot list`",
                    cluster_name
                ))
                .eprint();
                print_json!(&cluster);
            }
            CreateTarget::WorkerGroup(request) => {
                let cluster = client
                    .add_worker_group(scope, cluster_name, &request)
                    .await
                    .context(ApiSnafu)?;

                print_json!(&cluster);
            }
        }

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct HibernateCommand {
    #[command(flatten)]
    shoot: ShootArgs,

    /// Shoot cluster name.
    #[arg(short = 'n', long)]
    cluster_name: String,
}

impl Command<HibernateCommand> {
    async fn run(mut self, global_options: GlobalOptions) -> Result<(), Error> {
        let shoot = &mut self.inner.shoot;
        merge_active_profile(shoot, &global_options);

        let client = shoot.auth.client()?;
        client
            .hibernate_shoot_cluster(shoot.project.scope()?, &self.inner.cluster_name)
            .await
            .context(ApiSnafu)?;

        StyledStr::success(format!(
            "hibernation of `{}` requested",
            self.inner.cluster_name
        ))
        .eprint();

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct WakeupCommand {
    #[command(flatten)]
    shoot: ShootArgs,

    /// Shoot cluster name.
    #[arg(short = 'n', long)]
    cluster_name: String,
}

impl Command<WakeupCommand> {
    async fn run(mut self, global_options: GlobalOptions) -> Result<(), Error> {
        let shoot = &mut self.inner.shoot;
        merge_active_profile(shoot, &global_options);

        let client = shoot.auth.client()?;
        client
            .wake_up_shoot_cluster(shoot.project.scope()?, &self.inner.cluster_name)
            .await
            .context(ApiSnafu)?;

        StyledStr::success(format!("wake up of `{}` requested", self.inner.cluster_name)).eprint();

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct DeleteCommand {
    #[command(flatten)]
    shoot: ShootArgs,

    /// Shoot cluster name.
    #[arg(short = 'n', long)]
    cluster_name: String,

    /// Delete the worker group named by --wg-name instead of the cluster.
    #[arg(long)]
    workergroup: bool,

    /// Worker group to delete, required with --workergroup.
    #[arg(long)]
    wg_name: Option<String>,
}

impl Command<DeleteCommand> {
    async fn run(mut self, global_options: GlobalOptions) -> Result<(), Error> {
        let shoot = &mut self.inner.shoot;
        merge_active_profile(shoot, &global_options);

        let client = shoot.auth.client()?;
        let scope = shoot.project.scope()?;
        let cluster_name = &self.inner.cluster_name;

        if self.inner.workergroup {
            let wg_name = require(&self.inner.wg_name, "wg-name")?;
            let cluster = client
                .delete_worker_group(scope, cluster_name, wg_name)
                .await
                .context(ApiSnafu)?;

            print_json!(&cluster);
        } else {
            let body = client
                .delete_shoot_cluster(scope, cluster_name)
                .await
                .context(ApiSnafu)?;

            StyledStr::success(format!("deletion of `{}` requested", cluster_name)).eprint();
            if !body.trim().is_empty() {
                println!("{}", body.trim());
            }
        }

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct GenerateKubeconfigCommand {
    #[command(flatten)]
    shoot: ShootArgs,

    /// Shoot cluster name.
    #[arg(short = 'n', long)]
    cluster_name: String,

    /// File to store the kubeconfig in. Printed to stdout when omitted.
    #[arg(short, long)]
    output_path: Option<String>,

    /// How long the kubeconfig stays valid, in seconds.
    #[arg(long, default_value_t = DEFAULT_KUBECONFIG_DURATION)]
    config_duration: u64,
}

impl Command<GenerateKubeconfigCommand> {
    async fn run(mut self, global_options: GlobalOptions) -> Result<(), Error> {
        let shoot = &mut self.inner.shoot;
        merge_active_profile(shoot, &global_options);

        let client = shoot.auth.client()?;
        let kubeconfig = client
            .generate_kubeconfig(
                shoot.project.scope()?,
                &self.inner.cluster_name,
                self.inner.config_duration,
            )
            .await
            .context(ApiSnafu)?;

        match self.inner.output_path.as_deref().filter(|p| !p.is_empty()) {
            Some(output_path) => {
                let path = PathBuf::from(crate::expand_path(output_path));
                write_private(&path, kubeconfig.as_bytes())?;

                StyledStr::success(format!("kubeconfig written to {}", path.display())).eprint();
            }
            None => println!("{}", kubeconfig),
        }

        Ok(())
    }
}

#[derive(Parser, Debug)]
pub struct GetMonitoringCredsCommand {
    #[command(flatten)]
    shoot: ShootArgs,

    /// Shoot cluster name.
    #[arg(short = 'n', long)]
    cluster_name: String,

    /// File to store the credentials in. Printed to stdout when omitted.
    #[arg(short, long)]
    output_path: Option<String>,
}

impl Command<GetMonitoringCredsCommand> {
    async fn run(mut self, global_options: GlobalOptions) -> Result<(), Error> {
        let shoot = &mut self.inner.shoot;
        merge_active_profile(shoot, &global_options);

        let client = shoot.auth.client()?;
        let credentials = client
            .monitoring_credentials(shoot.project.scope()?, &self.inner.cluster_name)
            .await
            .context(ApiSnafu)?;

        match self.inner.output_path.as_deref().filter(|p| !p.is_empty()) {
            Some(output_path) => {
                let path = PathBuf::from(crate::expand_path(output_path));
                let contents = serde_json::to_string_pretty(&credentials).context(JsonSnafu)?;
                write_private(&path, contents.as_bytes())?;

                StyledStr::success(format!(
                    "monitoring credentials written to {}",
                    path.display()
                ))
                .eprint();
            }
            None => print_json!(&credentials),
        }

        Ok(())
    }
}

/// Replaces `path` with `contents`, readable by the owner only.
fn write_private(path: &Path, contents: &[u8]) -> Result<(), Error> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    options
        .open(path)
        .and_then(|mut file| file.write_all(contents))
        .context(WriteOutputSnafu { path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn write_private_replaces_longer_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("kubeconfig");
        fs::write(&path, "x".repeat(256)).unwrap();

        write_private(&path, b"kind: Config\n").unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "kind: Config\n");
    }

    #[test]
    fn delete_parses_worker_group() {
        let command = DeleteCommand::try_parse_from([
            "delete",
            "--cluster-name",
            "prod",
            "--workergroup",
            "--wg-name",
            "wg1",
        ])
        .unwrap();

        assert!(command.workergroup);
        assert_eq!(command.wg_name.as_deref(), Some("wg1"));
        assert_eq!(command.shoot.project.gardener_domain, "public");
    }

    #[test]
    fn kubeconfig_duration_defaults_to_one_day() {
        let command =
            GenerateKubeconfigCommand::try_parse_from(["generate-kubeconfig", "-n", "prod"])
                .unwrap();

        assert_eq!(command.config_duration, 86400);
        assert_eq!(command.output_path, None);
    }

    fn create_command(args: &[&str]) -> CreateCommand {
        let mut argv = vec!["create", "--cluster-name", "prod"];
        argv.extend_from_slice(args);
        CreateCommand::try_parse_from(argv).unwrap()
    }

    #[test]
    fn cluster_request_uses_worker_defaults() {
        let request = create_command(&["--cluster"]).cluster_request().unwrap();

        assert_eq!(request.shoot.name, "prod");
        assert_eq!(request.shoot.kubernetes.version, "1.28.7");
        assert_eq!(request.shoot.hibernation, None);

        let worker = &request.shoot.provider.workers[0];
        assert_eq!(worker.name, "");
        assert_eq!((worker.minimum, worker.maximum), (2, 3));
        assert_eq!(worker.machine.kind, "b.2c4gb");
        assert_eq!(worker.machine.image.name, "gardenlinux");
        assert_eq!(worker.volume.size, "50Gi");

        let body = serde_json::to_value(&request).unwrap();
        assert_eq!(
            body["shoot"]["provider"]["infrastructureConfig"]["floatingPoolName"],
            "ext-net"
        );
        assert!(body["shoot"]["provider"]["workers"][0].get("name").is_none());
        assert!(body["shoot"].get("hibernation").is_none());
    }

    #[test]
    fn cluster_request_carries_hibernation_schedule() {
        let request = create_command(&[
            "--cluster",
            "--wg-name",
            "wg1",
            "--hibernation-start",
            "00 18 * * 1,2,3,4,5",
            "--hibernation-end",
            "00 08 * * 1,2,3,4,5",
        ])
        .cluster_request()
        .unwrap();

        let hibernation = request.shoot.hibernation.clone().unwrap();
        assert_eq!(hibernation.schedules[0].start, "00 18 * * 1,2,3,4,5");
        assert_eq!(hibernation.schedules[0].end, "00 08 * * 1,2,3,4,5");
        assert_eq!(request.shoot.provider.workers[0].name, "wg1");
    }

    #[test]
    fn hibernation_start_requires_end() {
        let result = CreateCommand::try_parse_from([
            "create",
            "--cluster-name",
            "prod",
            "--cluster",
            "--hibernation-start",
            "00 18 * * *",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn cluster_and_workergroup_conflict() {
        let result = CreateCommand::try_parse_from([
            "create",
            "--cluster-name",
            "prod",
            "--cluster",
            "--workergroup",
        ]);

        assert!(result.is_err());
    }

    #[test]
    fn worker_group_name_is_limited_to_six_characters() {
        let command = create_command(&["--workergroup", "--wg-name", "toolong"]);

        assert!(matches!(
            command.worker_group_request(),
            Err(Error::InvalidFlag { flag: "wg-name", .. })
        ));
    }

    #[test]
    fn create_needs_cluster_or_workergroup() {
        let command = create_command(&[]);
        assert!(matches!(command.target(), Err(Error::NoCreateTarget {})));

        let command = create_command(&["--workergroup", "--wg-name", "wg2"]);
        assert!(matches!(
            command.target(),
            Ok(CreateTarget::WorkerGroup(ref request)) if request.worker.name == "wg2"
        ));
    }

    #[test]
    fn worker_group_requires_name() {
        let command = create_command(&["--workergroup"]);

        assert!(matches!(
            command.worker_group_request(),
            Err(Error::MissingFlag { flag: "wg-name" })
        ));
    }

    #[test]
    fn worker_minimum_cannot_exceed_maximum() {
        let command = create_command(&["--cluster", "--wg-min", "5", "--wg-max", "3"]);

        assert!(matches!(
            command.cluster_request(),
            Err(Error::InvalidFlag { flag: "wg-min", .. })
        ));
    }
}
