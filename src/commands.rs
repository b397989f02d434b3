use std::io::Write;

use futures::future;

use crate::api::{DdiClient, NewHost, Outcome};
use crate::config::{CnameCommand, Command, Confirm, HostAddArgs, HostCommand, Ipv4Command, SubnetCommand};
use crate::{prompt, render};

/// How a command finished, as far as the exit status is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Every item succeeded.
    Success,
    /// At least one item came back as a `fail` outcome (or the user declined a confirmation).
    Failed,
}

impl Status {
    fn from_all(outcomes: &[Outcome]) -> Self {
        if outcomes.iter().all(Outcome::is_success) { Status::Success } else { Status::Failed }
    }
}

/// Everything a command handler needs besides its own arguments.
pub struct Context {
    pub client: DdiClient,
    pub json: bool,
    /// Site for new hosts when `host add` isn't given `--site`.
    pub site_name: String,
}

/// Runs an API command. `password` commands never reach this point because they don't need a session.
pub async fn run<W: Write>(ctx: &Context, command: Command, out: &mut W) -> eyre::Result<Status> {
    match command {
        Command::Host(HostCommand::Add(args)) => host_add(ctx, args, out).await,
        Command::Host(HostCommand::Delete { hosts, confirm }) => host_delete(ctx, &hosts, confirm, out).await,
        Command::Host(HostCommand::Info { hosts }) => host_info(ctx, &hosts, out).await,
        Command::Cname(CnameCommand::Add { host, cname }) => cname_add(ctx, &host, &cname, out).await,
        Command::Cname(CnameCommand::Delete { cname, confirm }) => cname_delete(ctx, &cname, confirm, out).await,
        Command::Cname(CnameCommand::Info { cname }) => cname_info(ctx, &cname, out).await,
        Command::Ipv4(Ipv4Command::Info { ips }) => ipv4_info(ctx, &ips, out).await,
        Command::Ipv4(Ipv4Command::Free { subnet }) => ipv4_free(ctx, &subnet, out).await,
        Command::Subnet(SubnetCommand::Info { subnets }) => subnet_info(ctx, &subnets, out).await,
        Command::Password(_) => Err(eyre::eyre!("password commands do not use a DDI session")),
    }
}

async fn host_add<W: Write>(ctx: &Context, args: HostAddArgs, out: &mut W) -> eyre::Result<Status> {
    let host = NewHost {
        building: prompt::text_or(args.building, "Building")?,
        comment: args.comment,
        contact: prompt::text_or(args.contact, "Contact")?,
        department: prompt::text_or(args.department, "Department")?,
        ip: prompt::text_or(args.ip, "Ip")?,
        phone: prompt::text_or(args.phone, "Phone")?,
        site_name: args.site.unwrap_or_else(|| ctx.site_name.clone()),
        name: args.host,
    };

    log::debug!("Add operation called for host: {} at ip {}", host.name, host.ip);
    let outcome = ctx.client.add_host(&host).await?;

    if ctx.json {
        render::json(out, &outcome)?;
    } else if outcome.is_success() {
        writeln!(out, "Host: {} added with IP {}.", host.name, host.ip)?;
    } else {
        writeln!(out, "Host: {} addition failed.", host.name)?;
    }
    Ok(Status::from_all(&[outcome]))
}

async fn host_delete<W: Write>(ctx: &Context, hosts: &[String], confirm: Confirm, out: &mut W) -> eyre::Result<Status> {
    if !confirmed(confirm, "Are you sure you want to delete the host?", prompt::confirm)? {
        return Ok(Status::Failed);
    }

    log::debug!("Delete operation called on hosts: {hosts:?}");

    // Sequential: each line reports a delete that has already completed.
    let mut status = Status::Success;
    for host in hosts {
        let outcome = ctx.client.delete_host(host).await?;
        if ctx.json {
            render::json(out, &outcome)?;
        } else if outcome.is_success() {
            writeln!(out, "Host: {host} deleted.")?;
        } else {
            writeln!(out, "Deletion of host: {host} failed.")?;
        }
        if !outcome.is_success() {
            status = Status::Failed;
        }
    }
    Ok(status)
}

async fn host_info<W: Write>(ctx: &Context, hosts: &[String], out: &mut W) -> eyre::Result<Status> {
    log::debug!("Info operation called on hosts: {hosts:?}");
    let outcomes = lookup_all(hosts, |host| ctx.client.get_host(host)).await?;
    print_each(ctx, &outcomes, out, render::host_info)?;
    Ok(Status::from_all(&outcomes))
}

async fn cname_add<W: Write>(ctx: &Context, host: &str, cname: &str, out: &mut W) -> eyre::Result<Status> {
    let outcome = ctx.client.add_cname(cname, host).await?;

    if ctx.json {
        render::json(out, &outcome)?;
    } else if outcome.is_success() {
        writeln!(out, "CNAME: {cname} added to host: {host}.")?;
    } else {
        writeln!(out, "CNAME: {cname} addition to host {host} failed.")?;
    }
    Ok(Status::from_all(&[outcome]))
}

async fn cname_delete<W: Write>(ctx: &Context, cname: &str, confirm: Confirm, out: &mut W) -> eyre::Result<Status> {
    if !confirmed(confirm, "Are you sure you want to delete this CNAME?", prompt::confirm)? {
        return Ok(Status::Failed);
    }

    let outcome = ctx.client.delete_cname(cname).await?;

    if ctx.json {
        render::json(out, &outcome)?;
    } else if outcome.is_success() {
        writeln!(out, "CNAME: {cname} deleted.")?;
    } else {
        writeln!(out, "CNAME delete failed for: {cname}")?;
    }
    Ok(Status::from_all(&[outcome]))
}

async fn cname_info<W: Write>(ctx: &Context, cname: &str, out: &mut W) -> eyre::Result<Status> {
    let outcome = ctx.client.get_cname_info(cname).await?.require_rows();

    if ctx.json {
        render::json(out, &outcome)?;
    } else if outcome.is_success() {
        render::cname_info(out, &outcome)?;
    } else {
        writeln!(out, "CNAME info for {cname} failed.")?;
    }
    Ok(Status::from_all(&[outcome]))
}

async fn ipv4_info<W: Write>(ctx: &Context, ips: &[String], out: &mut W) -> eyre::Result<Status> {
    log::debug!("Info operation called on IPs: {ips:?}");
    let outcomes = lookup_all(ips, |ip| ctx.client.get_ipv4_info(ip)).await?;
    print_each(ctx, &outcomes, out, render::host_info)?;
    Ok(Status::from_all(&outcomes))
}

async fn ipv4_free<W: Write>(ctx: &Context, subnet: &str, out: &mut W) -> eyre::Result<Status> {
    let outcome = ctx.client.get_free_ipv4(subnet).await?;

    if ctx.json {
        render::json(out, &outcome)?;
    } else if outcome.is_success() {
        render::free_addresses(out, &outcome)?;
    } else {
        writeln!(out, "No free address found in subnet {subnet}.")?;
    }
    Ok(Status::from_all(&[outcome]))
}

async fn subnet_info<W: Write>(ctx: &Context, subnets: &[String], out: &mut W) -> eyre::Result<Status> {
    log::debug!("Info operation called on subnets: {subnets:?}");
    let outcomes = lookup_all(subnets, |subnet| ctx.client.get_subnet_info(subnet)).await?;
    print_each(ctx, &outcomes, out, render::subnet_info)?;
    Ok(Status::from_all(&outcomes))
}

/// Runs independent lookups concurrently, keeping results in argument order.
async fn lookup_all<'a, F, Fut>(items: &'a [String], lookup: F) -> eyre::Result<Vec<Outcome>>
where
    F: Fn(&'a str) -> Fut,
    Fut: Future<Output = eyre::Result<Outcome>>,
{
    let results = future::join_all(items.iter().map(|item| lookup(item.as_str()))).await;
    results.into_iter().collect()
}

/// Prints a list of lookup outcomes, using `text` for successful ones when not in JSON mode.
fn print_each<W, F>(ctx: &Context, outcomes: &[Outcome], out: &mut W, text: F) -> eyre::Result<()>
where
    W: Write,
    F: Fn(&mut W, &Outcome) -> eyre::Result<()>,
{
    for outcome in outcomes {
        if ctx.json {
            render::json(out, outcome)?;
        } else if outcome.is_success() {
            text(out, outcome)?;
        } else {
            writeln!(out, "Request failed, enable debugging for more.")?;
        }
    }
    Ok(())
}

/// Asks `question` through `ask` unless `--yes` was given. Declining is reported on stderr, never in command output.
fn confirmed<F>(confirm: Confirm, question: &str, ask: F) -> eyre::Result<bool>
where
    F: FnOnce(&str) -> eyre::Result<bool>,
{
    if confirm.yes || ask(question)? {
        Ok(true)
    } else {
        anstream::eprintln!("Aborted!");
        Ok(false)
    }
}
