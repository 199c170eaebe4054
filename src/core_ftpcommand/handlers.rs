use crate::core_ftpcommand::registry::{CommandDef, CommandRegistry, RegistryError};
use crate::core_ftpcommand::site::{
    handler as site, site_addip, site_adduser, site_delip, site_deluser, site_kick, site_user,
    site_who,
};
use crate::core_ftpcommand::{
    allo, auth, cdup, cwd, dele, feat, list, mdtm, mkd, noop, pass, pbsz, prot, pwd, quit, retr,
    rmd, rnfr, rnto, size, stor, stou, syst, type_, user,
};

/// The FTP verbs served by every session.
pub fn standard_registry() -> Result<CommandRegistry, RegistryError> {
    let mut registry = CommandRegistry::new("");

    registry.register_def(
        "USER",
        CommandDef::new(user::create).params(1, Some(1)).anonymous().syntax("USER <name>"),
    )?;
    registry.register_def("PASS", CommandDef::new(pass::create).anonymous())?;
    registry.register_def("QUIT", CommandDef::new(quit::create).anonymous())?;
    registry.register_def("SYST", CommandDef::new(syst::create).params(0, Some(0)).anonymous())?;
    registry.register_def("FEAT", CommandDef::new(feat::create).params(0, Some(0)).anonymous())?;
    registry.register_def(
        "AUTH",
        CommandDef::new(auth::create).params(1, Some(1)).anonymous().syntax("AUTH TLS"),
    )?;
    registry.register_def(
        "PBSZ",
        CommandDef::new(pbsz::create).params(1, Some(1)).anonymous().syntax("PBSZ 0"),
    )?;
    registry.register_def(
        "PROT",
        CommandDef::new(prot::create).params(1, Some(1)).anonymous().syntax("PROT <C|P>"),
    )?;

    registry.register_def("NOOP", CommandDef::new(noop::create).params(0, Some(0)))?;
    registry.register_def(
        "TYPE",
        CommandDef::new(type_::create).params(1, Some(2)).syntax("TYPE <A|I>"),
    )?;
    registry.register_def("ALLO", CommandDef::new(allo::create))?;

    registry.register_def("PWD", CommandDef::new(pwd::create).params(0, Some(0)))?;
    registry.register_def(
        "CWD",
        CommandDef::new(cwd::create).params(1, None).syntax("CWD <directory>"),
    )?;
    registry.register_def("CDUP", CommandDef::new(cdup::create).params(0, Some(0)))?;
    registry.register_def(
        "MKD",
        CommandDef::new(mkd::create).params(1, None).syntax("MKD <directory>"),
    )?;
    registry.register_def(
        "RMD",
        CommandDef::new(rmd::create).params(1, None).syntax("RMD <directory>"),
    )?;
    registry.register_def(
        "DELE",
        CommandDef::new(dele::create).params(1, None).syntax("DELE <file>"),
    )?;
    registry.register_def(
        "RNFR",
        CommandDef::new(rnfr::create).params(1, None).syntax("RNFR <path>"),
    )?;
    registry.register_def(
        "RNTO",
        CommandDef::new(rnto::create).params(1, None).syntax("RNTO <path>"),
    )?;
    registry.register_def(
        "SIZE",
        CommandDef::new(size::create).params(1, None).syntax("SIZE <file>"),
    )?;
    registry.register_def(
        "MDTM",
        CommandDef::new(mdtm::create).params(1, None).syntax("MDTM <file>"),
    )?;

    registry.register_def("LIST", CommandDef::new(list::create))?;
    registry.register_def("NLST", CommandDef::new(list::create_nlst))?;
    registry.register_def(
        "RETR",
        CommandDef::new(retr::create).params(1, None).syntax("RETR <file>"),
    )?;
    registry.register_def(
        "STOR",
        CommandDef::new(stor::create).params(1, None).syntax("STOR <file>"),
    )?;
    registry.register_def("STOU", CommandDef::new(stou::create).params(0, Some(0)))?;

    registry.register_def(
        "SITE",
        CommandDef::new(site::create).params(1, None).syntax("SITE <command> [arguments]"),
    )?;

    Ok(registry)
}

/// Sub-commands reachable through `SITE`.
pub fn site_registry() -> Result<CommandRegistry, RegistryError> {
    let mut registry = CommandRegistry::new("SITE ");

    registry.register_def("WHO", CommandDef::new(site_who::create).params(0, Some(0)))?;
    registry.register_def(
        "KICK",
        CommandDef::new(site_kick::create).params(1, Some(1)).syntax("SITE KICK <user>"),
    )?;
    registry.register_def(
        "ADDUSER",
        CommandDef::new(site_adduser::create)
            .params(2, None)
            .syntax("SITE ADDUSER <user> <password> [ident@ip ...]"),
    )?;
    registry.register_def(
        "DELUSER",
        CommandDef::new(site_deluser::create).params(1, Some(1)).syntax("SITE DELUSER <user>"),
    )?;
    registry.register_def(
        "ADDIP",
        CommandDef::new(site_addip::create)
            .params(2, None)
            .syntax("SITE ADDIP <user> <ident@ip> [...]"),
    )?;
    registry.register_def(
        "DELIP",
        CommandDef::new(site_delip::create)
            .params(2, None)
            .syntax("SITE DELIP <user> <ident@ip> [...]"),
    )?;
    registry.register_def(
        "USER",
        CommandDef::new(site_user::create).params(0, Some(1)).syntax("SITE USER [user]"),
    )?;

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registries_build() {
        let registry = standard_registry().unwrap();
        for verb in ["USER", "PASS", "RETR", "STOR", "STOU", "SITE", "NLST"] {
            assert!(registry.lookup(verb).is_ok(), "{} missing", verb);
        }
        assert!(registry.lookup("NOOP").unwrap().requires_login);
        assert!(!registry.lookup("USER").unwrap().requires_login);

        let site = site_registry().unwrap();
        assert_eq!(
            site.verbs(),
            vec!["ADDIP", "ADDUSER", "DELIP", "DELUSER", "KICK", "USER", "WHO"]
        );
    }
}
