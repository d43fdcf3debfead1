// Powerjet
// Copyright (C) Riff Labs Limited <team@riff.cc>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// long with this program.  If not, see <http://www.gnu.org/licenses/>.

/// Resource attributes a module can report as changed. The traversal code
/// passes the queried field list back into the Modify request so a module
/// only submits what actually differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Description,
    Size,
    ProtectionPolicy,
    PerformancePolicy,
    Mapping,
    Members,
    AccessPolicy,
    LockingPolicy,
    FolderRenamePolicy,
    SmbProperties,
    QuotaDefaults,
    HardLimit,
    SoftLimit,
    GracePeriod,
    DirectoryService,
    UnixUser,
    WindowsUser,
    Vlan,
    Mtu,
    Gateway,
    PrefixLength,
    Ports,
    ClusterMgmtAddress,
    StorageDiscoveryAddress,
    ServicePassword,
    SupportType,
    Proxy,
    CloudIq,
    Rsc,
    SessionState,
    Hosts,
    DefaultAccess,
    AnonymousAccess,
    NoSuid,
    Abe,
    BranchCache,
    ContinuousAvailability,
    Encryption,
    OfflineAvailability,
    Umask,
    WriteOrderConsistency,
}
